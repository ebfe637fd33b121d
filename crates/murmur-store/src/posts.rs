//! Timeline, thread cache, reply target and search results.
//!
//! The timeline holds the posts of the selected channel only, newest first.
//! Real-time arrivals are inserted at the front, older pages are appended at
//! the tail, and nothing is reordered afterwards.

use serde::Serialize;
use tracing::debug;

use murmur_shared::constants::FETCH_FAILED_ERROR;
use murmur_shared::models::{Delivery, Post};
use murmur_shared::types::{ChannelId, PostId};

/// A failed fetch, retained on the surface it was issued for until the next
/// successful load or reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub message: String,
}

impl FetchFailure {
    pub fn new(message: Option<String>) -> Self {
        Self {
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| FETCH_FAILED_ERROR.to_string()),
        }
    }
}

/// Posts of the selected channel.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Timeline {
    pub channel_id: Option<ChannelId>,
    pub posts: Vec<Post>,
    pub has_more: bool,
    pub loading: bool,
    pub loading_older: bool,
    /// Last page successfully requested for older history.
    pub page: u32,
    pub error: Option<FetchFailure>,
}

/// The single open thread.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadView {
    pub root_id: PostId,
    /// Root first, then replies in arrival order.
    pub posts: Vec<Post>,
    pub loading: bool,
    pub error: Option<FetchFailure>,
}

/// The active search and its results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchState {
    pub terms: String,
    pub results: Vec<Post>,
    pub loading: bool,
    pub error: Option<FetchFailure>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PostStore {
    timeline: Timeline,
    thread: Option<ThreadView>,
    reply_target: Option<PostId>,
    search: Option<SearchState>,
}

impl PostStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Reset
    // ------------------------------------------------------------------

    /// Point the timeline at `channel_id` and drop everything that belongs
    /// to the previous channel. The timeline is marked loading.
    pub fn reset_for_channel(&mut self, channel_id: ChannelId) {
        self.timeline = Timeline {
            channel_id: Some(channel_id),
            loading: true,
            ..Timeline::default()
        };
        self.thread = None;
        self.reply_target = None;
    }

    /// Drop timeline, thread, reply target and search results.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // ------------------------------------------------------------------
    // Timeline
    // ------------------------------------------------------------------

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn posts(&self) -> &[Post] {
        &self.timeline.posts
    }

    pub fn channel_id(&self) -> Option<&ChannelId> {
        self.timeline.channel_id.as_ref()
    }

    /// Whether a fetch response for `channel_id` still belongs here.
    /// A response that does not name its channel is accepted.
    pub fn accepts(&self, channel_id: Option<&ChannelId>) -> bool {
        match channel_id {
            None => true,
            Some(id) => self.timeline.channel_id.as_ref() == Some(id),
        }
    }

    /// Replace the timeline with a fresh fetch. Optimistic posts that the
    /// fetch does not contain stay at the front.
    pub fn set_posts(&mut self, posts: Vec<Post>, has_more: bool) {
        let mut merged: Vec<Post> = self
            .timeline
            .posts
            .drain(..)
            .filter(|p| !p.is_settled() && !posts.iter().any(|f| f.id == p.id))
            .collect();
        merged.extend(posts);
        self.timeline.posts = merged;
        self.timeline.has_more = has_more;
        self.timeline.loading = false;
        self.timeline.loading_older = false;
        self.timeline.page = 0;
        self.timeline.error = None;
    }

    /// Mark an older page as requested and return its number, or `None` if
    /// there is nothing more to load or a load is already running.
    pub fn begin_load_older(&mut self) -> Option<u32> {
        let timeline = &mut self.timeline;
        if timeline.channel_id.is_none()
            || timeline.loading
            || timeline.loading_older
            || !timeline.has_more
        {
            return None;
        }
        timeline.loading_older = true;
        Some(timeline.page + 1)
    }

    /// Append a page of older history after the existing posts. Posts that
    /// are already present are skipped.
    pub fn append_older_posts(&mut self, posts: Vec<Post>, has_more: bool) -> usize {
        let before = self.timeline.posts.len();
        for post in posts {
            if !self.contains_in_timeline(&post.id) {
                self.timeline.posts.push(post);
            }
        }
        self.timeline.has_more = has_more;
        if self.timeline.loading_older {
            self.timeline.page += 1;
        }
        self.timeline.loading_older = false;
        self.timeline.error = None;
        self.timeline.posts.len() - before
    }

    /// Insert a real-time post at the front. Returns `false` and drops the
    /// post if one with the same id is already in the timeline.
    pub fn prepend_new_post(&mut self, post: Post) -> bool {
        if self.contains_in_timeline(&post.id) {
            debug!(post = %post.id, "Dropping duplicate post");
            return false;
        }
        self.timeline.posts.insert(0, post);
        true
    }

    pub fn set_fetch_failed(&mut self, message: Option<String>) {
        self.timeline.loading = false;
        self.timeline.loading_older = false;
        self.timeline.error = Some(FetchFailure::new(message));
    }

    pub fn contains(&self, post_id: &PostId) -> bool {
        self.contains_in_timeline(post_id) || self.contains_in_thread(post_id)
    }

    fn contains_in_timeline(&self, post_id: &PostId) -> bool {
        self.timeline.posts.iter().any(|p| &p.id == post_id)
    }

    fn contains_in_thread(&self, post_id: &PostId) -> bool {
        self.thread
            .as_ref()
            .map(|t| t.posts.iter().any(|p| &p.id == post_id))
            .unwrap_or(false)
    }

    pub fn get(&self, post_id: &PostId) -> Option<&Post> {
        self.timeline
            .posts
            .iter()
            .chain(self.thread.iter().flat_map(|t| t.posts.iter()))
            .find(|p| &p.id == post_id)
    }

    // ------------------------------------------------------------------
    // Update / remove (timeline and thread alike)
    // ------------------------------------------------------------------

    /// Replace a post by id wherever it appears. Returns `true` if any copy
    /// was replaced.
    pub fn update_post(&mut self, post: Post) -> bool {
        let mut updated = false;
        for slot in self.slots_mut() {
            if slot.id == post.id {
                *slot = post.clone();
                updated = true;
            }
        }
        if let Some(search) = self.search.as_mut() {
            for slot in search.results.iter_mut().filter(|p| p.id == post.id) {
                *slot = post.clone();
            }
        }
        updated
    }

    /// Remove a post everywhere. Removing the root of the open thread closes
    /// the thread.
    pub fn remove_post(&mut self, post_id: &PostId) -> bool {
        let before = self.timeline.posts.len();
        self.timeline.posts.retain(|p| &p.id != post_id);
        let mut removed = self.timeline.posts.len() != before;

        if self.thread.as_ref().map(|t| &t.root_id) == Some(post_id) {
            self.thread = None;
            removed = true;
        } else if let Some(thread) = self.thread.as_mut() {
            let before = thread.posts.len();
            thread.posts.retain(|p| &p.id != post_id);
            removed |= thread.posts.len() != before;
        }

        if self.reply_target.as_ref() == Some(post_id) {
            self.reply_target = None;
        }
        if let Some(search) = self.search.as_mut() {
            search.results.retain(|p| &p.id != post_id);
        }
        removed
    }

    fn slots_mut(&mut self) -> impl Iterator<Item = &mut Post> {
        self.timeline
            .posts
            .iter_mut()
            .chain(self.thread.iter_mut().flat_map(|t| t.posts.iter_mut()))
    }

    // ------------------------------------------------------------------
    // Optimistic posts
    // ------------------------------------------------------------------

    /// Insert an optimistic post into the timeline if it belongs to the
    /// selected channel, and into the open thread if it replies to it.
    pub fn insert_optimistic(&mut self, post: Post) -> bool {
        let mut inserted = false;
        if self.timeline.channel_id.as_ref() == Some(&post.channel_id) {
            inserted |= self.prepend_new_post(post.clone());
        }
        if !post.is_root() {
            inserted |= self.append_thread_post(post);
        }
        inserted
    }

    /// Replace the post `local_id` with `post`, keeping its position. If a
    /// copy of `post` already arrived separately, that copy is removed so
    /// exactly one remains.
    pub fn replace_in_place(&mut self, local_id: &PostId, post: Post) -> bool {
        let mut replaced = replace_in(&mut self.timeline.posts, local_id, &post);
        if let Some(thread) = self.thread.as_mut() {
            replaced |= replace_in(&mut thread.posts, local_id, &post);
        }
        replaced
    }

    /// Set the delivery state of a post wherever it appears.
    pub fn set_delivery(&mut self, post_id: &PostId, delivery: Delivery) -> bool {
        let mut found = false;
        for slot in self.slots_mut() {
            if &slot.id == post_id {
                slot.delivery = delivery.clone();
                found = true;
            }
        }
        found
    }

    // ------------------------------------------------------------------
    // Thread
    // ------------------------------------------------------------------

    /// Open a thread, discarding any previous thread cache.
    pub fn open_thread(&mut self, root_id: PostId) {
        self.thread = Some(ThreadView {
            root_id,
            posts: Vec::new(),
            loading: true,
            error: None,
        });
    }

    pub fn close_thread(&mut self) {
        self.thread = None;
    }

    pub fn thread(&self) -> Option<&ThreadView> {
        self.thread.as_ref()
    }

    pub fn thread_root(&self) -> Option<&PostId> {
        self.thread.as_ref().map(|t| &t.root_id)
    }

    pub fn thread_posts(&self) -> &[Post] {
        self.thread.as_ref().map(|t| t.posts.as_slice()).unwrap_or(&[])
    }

    /// Fill the open thread with fetched posts. Optimistic replies that are
    /// not part of the fetch are kept at the end. Returns `false` if the
    /// fetch is for a thread that is no longer open.
    pub fn set_thread_posts(&mut self, root_id: &PostId, posts: Vec<Post>) -> bool {
        let Some(thread) = self.thread.as_mut().filter(|t| &t.root_id == root_id) else {
            return false;
        };
        let local: Vec<Post> = thread
            .posts
            .drain(..)
            .filter(|p| !p.is_settled() && !posts.iter().any(|f| f.id == p.id))
            .collect();
        thread.posts = posts;
        thread.posts.extend(local);
        thread.loading = false;
        thread.error = None;
        true
    }

    /// Append a post to the open thread if it is the root or a reply to it.
    /// Idempotent by post id.
    pub fn append_thread_post(&mut self, post: Post) -> bool {
        let Some(thread) = self.thread.as_mut() else {
            return false;
        };
        if post.thread_root() != &thread.root_id {
            return false;
        }
        if thread.posts.iter().any(|p| p.id == post.id) {
            return false;
        }
        thread.posts.push(post);
        true
    }

    pub fn set_thread_failed(&mut self, root_id: &PostId, message: Option<String>) -> bool {
        match self.thread.as_mut().filter(|t| &t.root_id == root_id) {
            Some(thread) => {
                thread.loading = false;
                thread.error = Some(FetchFailure::new(message));
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Reply target
    // ------------------------------------------------------------------

    pub fn set_reply_target(&mut self, post_id: PostId) {
        self.reply_target = Some(post_id);
    }

    pub fn clear_reply_target(&mut self) {
        self.reply_target = None;
    }

    pub fn reply_target(&self) -> Option<&PostId> {
        self.reply_target.as_ref()
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    pub fn begin_search(&mut self, terms: String) {
        self.search = Some(SearchState {
            terms,
            loading: true,
            ..SearchState::default()
        });
    }

    /// Store results if they answer the active search.
    pub fn set_search_results(&mut self, query: &str, posts: Vec<Post>) -> bool {
        match self.search.as_mut().filter(|s| s.terms == query) {
            Some(search) => {
                search.results = posts;
                search.loading = false;
                search.error = None;
                true
            }
            None => false,
        }
    }

    pub fn set_search_failed(&mut self, query: &str, message: Option<String>) -> bool {
        match self.search.as_mut().filter(|s| s.terms == query) {
            Some(search) => {
                search.loading = false;
                search.error = Some(FetchFailure::new(message));
                true
            }
            None => false,
        }
    }

    pub fn clear_search(&mut self) {
        self.search = None;
    }

    pub fn search(&self) -> Option<&SearchState> {
        self.search.as_ref()
    }
}

fn replace_in(posts: &mut Vec<Post>, local_id: &PostId, post: &Post) -> bool {
    let Some(index) = posts.iter().position(|p| &p.id == local_id) else {
        return false;
    };
    posts[index] = post.clone();
    let mut i = 0;
    posts.retain(|p| {
        let keep = i == index || p.id != post.id;
        i += 1;
        keep
    });
    true
}
