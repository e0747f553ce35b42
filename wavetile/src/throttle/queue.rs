//! Pending request queue.
//!
//! Requests are ordered by priority (lower values first), then by arrival
//! (FIFO within the same priority). Unlike a heap, the queue can be scanned
//! in order, which admission needs: the first entry whose domain has spare
//! capacity wins, even if better-priority entries are ahead of it.

use std::collections::HashMap;

use tokio::sync::oneshot;
use tokio::time::Instant;

use super::error::ThrottleError;
use crate::target::TileTarget;

/// Sender half of a request's completion.
pub(super) type CompletionSender<T> =
    oneshot::Sender<Result<<T as TileTarget>::Output, ThrottleError>>;

/// A tile load waiting for (or holding) admission.
pub(super) struct PendingRequest<T: TileTarget> {
    /// Handle used to start the load once admitted.
    pub target: T,

    /// Address to load.
    pub locator: String,

    /// Origin host used for per-domain accounting.
    pub domain: String,

    /// Lower values are admitted first.
    pub priority: i64,

    /// Where the result is delivered.
    pub completion: CompletionSender<T>,

    /// When the request was submitted.
    pub submitted_at: Instant,
}

impl<T: TileTarget> PendingRequest<T> {
    pub fn new(
        target: T,
        locator: String,
        domain: String,
        priority: i64,
        completion: CompletionSender<T>,
    ) -> Self {
        Self {
            target,
            locator,
            domain,
            priority,
            completion,
            submitted_at: Instant::now(),
        }
    }
}

impl<T: TileTarget> std::fmt::Debug for PendingRequest<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("locator", &self.locator)
            .field("domain", &self.domain)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Priority-ordered queue of requests waiting for capacity.
///
/// Not thread-safe; the throttler keeps it behind its state mutex.
pub(super) struct PendingQueue<T: TileTarget> {
    entries: Vec<PendingRequest<T>>,
}

impl<T: TileTarget> PendingQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a request after every entry with the same or better priority.
    pub fn push(&mut self, request: PendingRequest<T>) {
        let index = self
            .entries
            .partition_point(|entry| entry.priority <= request.priority);
        self.entries.insert(index, request);
    }

    /// Removes and returns the first request, in priority order, accepted by
    /// `eligible`.
    pub fn take_first_eligible<F>(&mut self, mut eligible: F) -> Option<PendingRequest<T>>
    where
        F: FnMut(&PendingRequest<T>) -> bool,
    {
        let index = self.entries.iter().position(|entry| eligible(entry))?;
        Some(self.entries.remove(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of queued requests per domain.
    pub fn domain_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for entry in &self.entries {
            *counts.entry(entry.domain.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Iterates in admission-priority order.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &PendingRequest<T>> {
        self.entries.iter()
    }
}

impl<T: TileTarget> std::fmt::Debug for PendingQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingQueue")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{BoxFuture, LoadError};

    /// A target that is never started by these tests.
    struct InertTarget;

    impl TileTarget for InertTarget {
        type Output = ();

        fn begin_load(self, _locator: String) -> BoxFuture<'static, Result<(), LoadError>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn make_request(name: &str, domain: &str, priority: i64) -> PendingRequest<InertTarget> {
        let (tx, _rx) = oneshot::channel();
        PendingRequest::new(
            InertTarget,
            name.to_string(),
            domain.to_string(),
            priority,
            tx,
        )
    }

    fn names(queue: &PendingQueue<InertTarget>) -> Vec<&str> {
        queue.iter().map(|r| r.locator.as_str()).collect()
    }

    #[test]
    fn test_priority_ordering() {
        let mut queue = PendingQueue::new();

        queue.push(make_request("far", "a", 30));
        queue.push(make_request("center", "a", 0));
        queue.push(make_request("near", "a", 10));

        assert_eq!(names(&queue), vec!["center", "near", "far"]);
    }

    #[test]
    fn test_fifo_within_priority() {
        let mut queue = PendingQueue::new();

        queue.push(make_request("first", "a", 5));
        queue.push(make_request("second", "b", 5));
        queue.push(make_request("urgent", "a", -1));
        queue.push(make_request("third", "a", 5));

        assert_eq!(names(&queue), vec!["urgent", "first", "second", "third"]);
    }

    #[test]
    fn test_take_first_eligible_skips_saturated_domains() {
        let mut queue = PendingQueue::new();

        queue.push(make_request("a1", "a", 1));
        queue.push(make_request("a2", "a", 2));
        queue.push(make_request("b1", "b", 9));
        queue.push(make_request("b2", "b", 10));

        let taken = queue.take_first_eligible(|r| r.domain != "a").unwrap();
        assert_eq!(taken.locator, "b1");
        assert_eq!(names(&queue), vec!["a1", "a2", "b2"]);

        let taken = queue.take_first_eligible(|_| true).unwrap();
        assert_eq!(taken.locator, "a1");
    }

    #[test]
    fn test_take_first_eligible_none_when_all_blocked() {
        let mut queue = PendingQueue::new();
        queue.push(make_request("a1", "a", 1));

        assert!(queue.take_first_eligible(|_| false).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_domain_counts() {
        let mut queue = PendingQueue::new();
        assert!(queue.is_empty());

        queue.push(make_request("a1", "a", 1));
        queue.push(make_request("a2", "a", 2));
        queue.push(make_request("b1", "b", 3));

        let counts = queue.domain_counts();
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("b"), Some(&1));
        assert_eq!(counts.get("c"), None);
    }
}
