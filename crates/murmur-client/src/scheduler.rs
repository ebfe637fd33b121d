//! Logical clock and cancellable timers.
//!
//! Time only moves when the owner calls [`Scheduler::advance_to`]. The bridge
//! drives it from a tokio interval; tests drive it by hand.

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Work the engine performs on a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Purge expired typing entries and idle throttle windows.
    SweepTyping,
    /// Fail sends that have been pending too long.
    ExpireSends,
}

/// A timer that came due, with the logical time it was due at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub at_ms: u64,
    pub task: Task,
}

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    due_ms: u64,
    period_ms: Option<u64>,
    task: Task,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule_once(&mut self, delay_ms: u64, task: Task) -> TimerId {
        self.insert(self.now_ms.saturating_add(delay_ms), None, task)
    }

    /// Fire `task` every `period_ms`, first one period from now.
    pub fn schedule_every(&mut self, period_ms: u64, task: Task) -> TimerId {
        let period_ms = period_ms.max(1);
        self.insert(self.now_ms.saturating_add(period_ms), Some(period_ms), task)
    }

    fn insert(&mut self, due_ms: u64, period_ms: Option<u64>, task: Task) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due_ms,
            period_ms,
            task,
        });
        id
    }

    /// Cancel a timer. Returns `false` if it already fired or never existed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Move the clock forward to `now_ms` and return every timer that came
    /// due, ordered by due time. Missed periods of a repeating timer are
    /// coalesced into a single firing at the latest due time. The clock
    /// never moves backwards and stops at `u64::MAX`.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<Fired> {
        if now_ms <= self.now_ms {
            return Vec::new();
        }
        self.now_ms = now_ms;

        let mut fired = Vec::new();
        self.timers.retain_mut(|timer| {
            if timer.due_ms > now_ms {
                return true;
            }
            match timer.period_ms {
                Some(period) => {
                    let missed = (now_ms - timer.due_ms) / period;
                    let at_ms = timer.due_ms + missed * period;
                    fired.push(Fired {
                        at_ms,
                        task: timer.task,
                    });
                    // No period left before the end of the clock.
                    match at_ms.checked_add(period) {
                        Some(next) => {
                            timer.due_ms = next;
                            true
                        }
                        None => false,
                    }
                }
                None => {
                    fired.push(Fired {
                        at_ms: timer.due_ms,
                        task: timer.task,
                    });
                    false
                }
            }
        });
        fired.sort_by_key(|f| f.at_ms);
        trace!(now_ms, fired = fired.len(), "Clock advanced");
        fired
    }

    pub fn advance_by(&mut self, delta_ms: u64) -> Vec<Fired> {
        self.advance_to(self.now_ms.saturating_add(delta_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_timer_fires_each_period() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(1_000, Task::SweepTyping);

        assert!(scheduler.advance_to(999).is_empty());
        assert_eq!(
            scheduler.advance_to(1_000),
            vec![Fired {
                at_ms: 1_000,
                task: Task::SweepTyping
            }]
        );
        assert_eq!(scheduler.advance_to(2_500)[0].at_ms, 2_000);
        assert_eq!(scheduler.advance_to(3_000)[0].at_ms, 3_000);
    }

    #[test]
    fn test_missed_periods_are_coalesced() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(1_000, Task::SweepTyping);

        let fired = scheduler.advance_to(6_400);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].at_ms, 6_000);
        assert!(scheduler.advance_to(6_999).is_empty());
        assert_eq!(scheduler.advance_to(7_000).len(), 1);
    }

    #[test]
    fn test_once_timer_fires_once() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(100);
        scheduler.schedule_once(50, Task::ExpireSends);

        assert_eq!(scheduler.advance_by(50)[0].at_ms, 150);
        assert!(scheduler.advance_by(1_000).is_empty());
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule_every(10, Task::SweepTyping);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.advance_to(100).is_empty());
    }

    #[test]
    fn test_fired_ordered_by_due_time() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(100, Task::SweepTyping);
        scheduler.schedule_once(250, Task::ExpireSends);

        let fired = scheduler.advance_to(350);
        assert_eq!(
            fired,
            vec![
                Fired {
                    at_ms: 250,
                    task: Task::ExpireSends
                },
                Fired {
                    at_ms: 300,
                    task: Task::SweepTyping
                },
            ]
        );
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(500);
        scheduler.advance_to(100);
        assert_eq!(scheduler.now_ms(), 500);
    }

    #[test]
    fn test_clock_saturates_at_max() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(1_000, Task::SweepTyping);
        scheduler.advance_to(10);

        let fired = scheduler.advance_by(u64::MAX);
        assert_eq!(scheduler.now_ms(), u64::MAX);
        assert_eq!(fired.len(), 1);
        assert_eq!(scheduler.pending_timers(), 0);

        assert!(scheduler.advance_by(1).is_empty());
    }
}
