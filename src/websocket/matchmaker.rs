use std::collections::VecDeque;

use crate::websocket::registry::SessionId;

/// Outcome of submitting a session to the matchmaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A waiting partner was found; the caller links the pair.
    Matched(SessionId),
    /// No eligible partner; the session now waits at the back of the queue.
    Enqueued,
}

/// FIFO queue of sessions awaiting a partner. Entries that went stale
/// (disconnected while queued) are discarded lazily during the scan;
/// the queue itself holds only ids and judges liveness through the
/// caller-supplied predicate.
#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: VecDeque<SessionId>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans from the front for the longest-waiting live session. Examined
    /// entries are removed; stale ones and a same-id entry are discarded,
    /// a matched candidate is never re-inserted.
    pub fn submit<F>(&mut self, id: &SessionId, mut is_live: F) -> Submission
    where
        F: FnMut(&SessionId) -> bool,
    {
        while let Some(candidate) = self.waiting.pop_front() {
            if candidate == *id {
                continue;
            }
            if !is_live(&candidate) {
                continue;
            }
            return Submission::Matched(candidate);
        }
        self.waiting.push_back(id.clone());
        Submission::Enqueued
    }

    /// Removes a session from the queue if present; no-op otherwise.
    pub fn remove(&mut self, id: &SessionId) {
        self.waiting.retain(|queued| queued != id);
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> SessionId {
        format!("session-{}", n)
    }

    #[test]
    fn pairs_in_fifo_order() {
        let mut queue = MatchQueue::new();
        assert_eq!(queue.submit(&id(1), |_| true), Submission::Enqueued);
        assert_eq!(queue.submit(&id(2), |_| true), Submission::Enqueued);

        // The longest-waiting session is served first.
        assert_eq!(queue.submit(&id(3), |_| true), Submission::Matched(id(1)));
        assert_eq!(queue.submit(&id(4), |_| true), Submission::Matched(id(2)));
        assert!(queue.is_empty());
    }

    #[test]
    fn discards_stale_entries_during_scan() {
        let mut queue = MatchQueue::new();
        queue.submit(&id(1), |_| true);
        queue.submit(&id(2), |_| true);
        queue.submit(&id(3), |_| true);

        // 1 and 2 disconnected while queued; 3 is the match.
        let outcome = queue.submit(&id(4), |candidate| *candidate == id(3));
        assert_eq!(outcome, Submission::Matched(id(3)));
        assert!(queue.is_empty());
    }

    #[test]
    fn never_matches_itself() {
        let mut queue = MatchQueue::new();
        queue.submit(&id(1), |_| true);

        // A reentrant submission of the queued session cannot self-pair.
        assert_eq!(queue.submit(&id(1), |_| true), Submission::Enqueued);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.submit(&id(2), |_| true), Submission::Matched(id(1)));
    }

    #[test]
    fn exhausted_queue_enqueues_at_back() {
        let mut queue = MatchQueue::new();
        queue.submit(&id(1), |_| true);
        assert_eq!(queue.submit(&id(2), |_| false), Submission::Enqueued);
        assert_eq!(queue.len(), 1);

        // 1 was discarded as stale, so 2 now heads the queue.
        assert_eq!(queue.submit(&id(3), |_| true), Submission::Matched(id(2)));
    }

    #[test]
    fn remove_is_a_noop_when_absent() {
        let mut queue = MatchQueue::new();
        queue.submit(&id(1), |_| true);
        queue.remove(&id(2));
        assert_eq!(queue.len(), 1);
        queue.remove(&id(1));
        assert!(queue.is_empty());
    }
}
