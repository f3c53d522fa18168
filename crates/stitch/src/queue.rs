use std::collections::VecDeque;

/// A media identifier extracted from in-band metadata, waiting for playback to
/// reach its presentation timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedIdEntry {
    pub media_id: String,
    /// Playback-time offset in seconds at which the id becomes due.
    pub timestamp: f64,
    processed: bool,
}

/// FIFO of timed media identifiers.
///
/// Identifiers may arrive out of timestamp order across segment boundaries, so
/// consumption marks entries in place and eviction only ever removes a
/// processed prefix; a not-yet-due entry blocks eviction of everything behind
/// it. The queue is unbounded: with broken or adversarial metadata it can grow
/// without limit, which is an accepted risk for a single playback session.
#[derive(Debug, Default)]
pub struct TimedIdQueue {
    entries: VecDeque<TimedIdEntry>,
}

impl TimedIdQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an unprocessed entry, preserving arrival order.
    pub fn push(&mut self, media_id: String, timestamp: f64) {
        self.entries.push_back(TimedIdEntry {
            media_id,
            timestamp,
            processed: false,
        });
    }

    /// Hands every due, unprocessed entry to `sink` and marks it processed,
    /// then evicts the processed prefix. Entries marked out of order are kept
    /// until everything ahead of them has been consumed.
    pub fn consume_ready<F>(&mut self, current_time: f64, mut sink: F)
    where
        F: FnMut(&str),
    {
        for entry in self.entries.iter_mut() {
            if entry.processed {
                continue;
            }
            if entry.timestamp <= current_time {
                sink(&entry.media_id);
                entry.processed = true;
            }
        }

        while self.entries.front().map_or(false, |entry| entry.processed) {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_with(entries: &[(&str, f64)]) -> TimedIdQueue {
        let mut queue = TimedIdQueue::new();
        for (id, ts) in entries {
            queue.push(id.to_string(), *ts);
        }
        queue
    }

    #[test]
    fn consumes_due_entries_in_arrival_order() {
        let mut queue = queue_with(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        let mut seen = Vec::new();
        queue.consume_ready(2.5, |id| seen.push(id.to_string()));
        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn eviction_is_prefix_only() {
        // b arrives between a and c but is due later than both.
        let mut queue = queue_with(&[("a", 1.0), ("b", 5.0), ("c", 2.0)]);
        let mut seen = Vec::new();
        queue.consume_ready(3.0, |id| seen.push(id.to_string()));
        // a and c are consumed, but b blocks eviction of c.
        assert_eq!(seen, vec!["a", "c"]);
        assert_eq!(queue.len(), 2);

        // Once b becomes due the whole processed prefix drains.
        queue.consume_ready(5.0, |id| seen.push(id.to_string()));
        assert_eq!(seen, vec!["a", "c", "b"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn processed_entries_are_never_consumed_twice() {
        let mut queue = queue_with(&[("a", 1.0), ("b", 10.0)]);
        let mut count = 0;
        queue.consume_ready(2.0, |_| count += 1);
        queue.consume_ready(3.0, |_| count += 1);
        assert_eq!(count, 1);
    }

    #[test]
    fn not_yet_due_entries_survive() {
        let mut queue = queue_with(&[("a", 10.0)]);
        queue.consume_ready(1.0, |_| panic!("nothing is due"));
        assert_eq!(queue.len(), 1);
    }
}
