use std::collections::HashMap;

use serde::Serialize;

use murmur_shared::models::Reaction;
use murmur_shared::types::{PostId, UserId};

/// Reactions grouped by post. Never holds the same (post, user, emoji)
/// triple twice. Toggling is left to the caller.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ReactionStore {
    by_post: HashMap<PostId, Vec<Reaction>>,
}

impl ReactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the reactions of one post.
    pub fn set_reactions_for_post(&mut self, post_id: PostId, reactions: Vec<Reaction>) {
        let mut deduped: Vec<Reaction> = Vec::with_capacity(reactions.len());
        for reaction in reactions.into_iter().filter(|r| r.post_id == post_id) {
            if !deduped.iter().any(|r| r.same_triple(&reaction)) {
                deduped.push(reaction);
            }
        }
        if deduped.is_empty() {
            self.by_post.remove(&post_id);
        } else {
            self.by_post.insert(post_id, deduped);
        }
    }

    /// Merge reactions for many posts into the existing sets.
    pub fn set_bulk_reactions(&mut self, reactions: Vec<Reaction>) {
        for reaction in reactions {
            self.add_reaction(reaction);
        }
    }

    /// Add a reaction. Returns `false` if the triple is already present.
    pub fn add_reaction(&mut self, reaction: Reaction) -> bool {
        let list = self.by_post.entry(reaction.post_id.clone()).or_default();
        if list.iter().any(|r| r.same_triple(&reaction)) {
            return false;
        }
        list.push(reaction);
        true
    }

    /// Remove the exact (post, user, emoji) triple. Returns `true` if removed.
    pub fn remove_reaction(&mut self, reaction: &Reaction) -> bool {
        let Some(list) = self.by_post.get_mut(&reaction.post_id) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| !r.same_triple(reaction));
        let removed = list.len() != before;
        if list.is_empty() {
            self.by_post.remove(&reaction.post_id);
        }
        removed
    }

    pub fn remove_post(&mut self, post_id: &PostId) {
        self.by_post.remove(post_id);
    }

    pub fn clear(&mut self) {
        self.by_post.clear();
    }

    pub fn reactions_for(&self, post_id: &PostId) -> &[Reaction] {
        self.by_post.get(post_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_reacted(&self, post_id: &PostId, user_id: &UserId, emoji_name: &str) -> bool {
        self.reactions_for(post_id)
            .iter()
            .any(|r| &r.user_id == user_id && r.emoji_name == emoji_name)
    }

    /// Per-emoji counts for a post, in first-seen order.
    pub fn counts_for(&self, post_id: &PostId) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for reaction in self.reactions_for(post_id) {
            match counts.iter_mut().find(|(emoji, _)| emoji == &reaction.emoji_name) {
                Some((_, count)) => *count += 1,
                None => counts.push((reaction.emoji_name.clone(), 1)),
            }
        }
        counts
    }

    pub fn is_empty(&self) -> bool {
        self.by_post.is_empty()
    }

    pub fn all(&self) -> &HashMap<PostId, Vec<Reaction>> {
        &self.by_post
    }
}
