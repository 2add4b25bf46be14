//! One-shot timer queue driven by the game loop.
//!
//! Timers never run on their own thread. The loop calls [`TimerQueue::advance`]
//! once per tick with the elapsed time and handles whatever fired.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Handle of a scheduled timer. Never reused within one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Pending one-shot events ordered by fire time
#[derive(Debug)]
pub struct TimerQueue<E> {
    /// Keyed by (fire time, handle) so equal deadlines fire in schedule order
    events: BTreeMap<(Duration, TimerHandle), E>,
    deadlines: HashMap<TimerHandle, Duration>,
    now: Duration,
    next_handle: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            events: BTreeMap::new(),
            deadlines: HashMap::new(),
            now: Duration::ZERO,
            next_handle: 1,
        }
    }

    /// Schedule `event` to fire once `delay` has elapsed
    pub fn schedule_after(&mut self, delay: Duration, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;

        let fire_at = self.now + delay;
        self.events.insert((fire_at, handle), event);
        self.deadlines.insert(handle, fire_at);
        handle
    }

    /// Cancel a pending timer. Returns the event if it had not fired yet.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<E> {
        let fire_at = self.deadlines.remove(&handle)?;
        self.events.remove(&(fire_at, handle))
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle)
    }

    /// Time left before `handle` fires
    pub fn remaining(&self, handle: TimerHandle) -> Option<Duration> {
        self.deadlines
            .get(&handle)
            .map(|fire_at| fire_at.saturating_sub(self.now))
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }

    /// Move time forward and return every event whose deadline has passed,
    /// earliest first
    pub fn advance(&mut self, delta: Duration) -> Vec<(TimerHandle, E)> {
        self.now += delta;

        let mut fired = Vec::new();
        while let Some(entry) = self.events.first_entry() {
            let (fire_at, handle) = *entry.key();
            if fire_at > self.now {
                break;
            }
            let event = entry.remove();
            self.deadlines.remove(&handle);
            fired.push((handle, event));
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_after(Duration::from_secs(90), "greater");
        queue.schedule_after(Duration::from_secs(30), "lesser");
        queue.schedule_after(Duration::from_secs(60), "regular");

        assert!(queue.advance(Duration::from_secs(29)).is_empty());

        let fired: Vec<_> = queue
            .advance(Duration::from_secs(61))
            .into_iter()
            .map(|(_, e)| e)
            .collect();
        assert_eq!(fired, vec!["lesser", "regular", "greater"]);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_cancel_prevents_fire() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_after(Duration::from_secs(5), 1u64);
        let other = queue.schedule_after(Duration::from_secs(5), 2u64);
        assert_ne!(handle, other);

        assert_eq!(queue.cancel(handle), Some(1));
        assert_eq!(queue.cancel(handle), None);
        assert!(!queue.is_pending(handle));

        let fired = queue.advance(Duration::from_secs(5));
        assert_eq!(fired, vec![(other, 2)]);
    }

    #[test]
    fn test_remaining() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_after(Duration::from_secs(10), ());
        queue.advance(Duration::from_millis(2500));
        assert_eq!(queue.remaining(handle), Some(Duration::from_millis(7500)));
        queue.advance(Duration::from_millis(7500));
        assert_eq!(queue.remaining(handle), None);
    }
}
