//! A priority queue for small non-negative integer priorities.
use std::collections::VecDeque;

/// A FIFO-within-priority queue backed by one bucket per priority.
///
/// Priorities must be below the bound given to `BucketQueue::new`. Items with equal
/// priority come out in insertion order. `pop` scans forward from the lowest bucket that
/// may be non-empty; A* with a consistent heuristic never pushes below the priority it is
/// expanding, so the scan position only moves backward in the rare case that it does.
///
/// # Examples
/// ```
/// use pyramid_solver::queue::BucketQueue;
/// let mut queue = BucketQueue::new(10);
/// queue.push("b", 3);
/// queue.push("a", 1);
/// queue.push("c", 3);
/// assert_eq!(queue.pop(), Some("a"));
/// assert_eq!(queue.pop(), Some("b"));
/// assert_eq!(queue.pop(), Some("c"));
/// assert_eq!(queue.pop(), None);
/// ```
#[derive(Clone, Debug)]
pub struct BucketQueue<T> {
    buckets: Vec<VecDeque<T>>,
    lowest: usize,
    len: usize,
}

impl<T> BucketQueue<T> {
    /// Creates an empty queue accepting priorities `0..bound`.
    pub fn new(bound: usize) -> Self {
        BucketQueue {
            buckets: (0..bound).map(|_| VecDeque::new()).collect(),
            lowest: bound,
            len: 0,
        }
    }

    /// Adds `item` with the given priority.
    ///
    /// # Panics
    /// Panics if `priority` is not below the queue's bound.
    pub fn push(&mut self, item: T, priority: usize) {
        assert!(
            priority < self.buckets.len(),
            "priority {} exceeds queue bound {}",
            priority,
            self.buckets.len()
        );
        self.buckets[priority].push_back(item);
        self.lowest = self.lowest.min(priority);
        self.len += 1;
    }

    /// Removes the oldest item among those with the smallest priority.
    pub fn pop(&mut self) -> Option<T> {
        self.pop_with_priority().map(|(item, _)| item)
    }

    /// Like `pop`, also returning the item's priority.
    pub fn pop_with_priority(&mut self) -> Option<(T, usize)> {
        while self.lowest < self.buckets.len() {
            if let Some(item) = self.buckets[self.lowest].pop_front() {
                self.len -= 1;
                return Some((item, self.lowest));
            }
            self.lowest += 1;
        }
        None
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The priorities this queue accepts are `0..bound()`.
    pub fn bound(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_new_queue_is_empty() {
        let mut queue: BucketQueue<u32> = BucketQueue::new(5);
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.bound(), 5);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_priorities_come_out_non_decreasing_and_fifo() {
        let mut rng = SmallRng::seed_from_u64(514514);
        let mut queue = BucketQueue::new(20);
        for i in 0..500 {
            queue.push(i, rng.gen_range(0..20));
        }
        assert_eq!(queue.len(), 500);

        let mut last: Option<(usize, usize)> = None;
        while let Some((item, priority)) = queue.pop_with_priority() {
            if let Some((last_item, last_priority)) = last {
                assert!(priority >= last_priority);
                if priority == last_priority {
                    assert!(item > last_item, "equal priorities must keep insertion order");
                }
            }
            last = Some((item, priority));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_push_below_scan_position() {
        let mut queue = BucketQueue::new(10);
        queue.push('x', 5);
        queue.push('y', 7);
        assert_eq!(queue.pop(), Some('x'));
        queue.push('z', 2);
        assert_eq!(queue.pop(), Some('z'));
        assert_eq!(queue.pop(), Some('y'));
    }

    #[test]
    fn test_interleaved_push_pop() {
        let mut queue = BucketQueue::new(4);
        queue.push(1, 0);
        queue.push(2, 1);
        assert_eq!(queue.pop(), Some(1));
        queue.push(3, 1);
        queue.push(4, 3);
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop(), Some(4));
    }

    #[test]
    #[should_panic(expected = "exceeds queue bound")]
    fn test_push_at_bound_panics() {
        let mut queue = BucketQueue::new(3);
        queue.push((), 3);
    }
}
