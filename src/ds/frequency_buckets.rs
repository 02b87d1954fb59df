//! Frequency buckets for O(1) LFU tracking.
//!
//! Stores values in a `SlotArena` and threads each one onto the list of the
//! frequency bucket it belongs to. Buckets are themselves linked in ascending
//! frequency order, so the minimum is always known and a full ordered walk
//! never needs a sort.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        FrequencyBuckets<T> Layout                           │
//! │                                                                             │
//! │   entries: SlotArena<Node<T>>                                               │
//! │   ┌──────┬──────────────────────────────┐                                   │
//! │   │ Slot │ Node                         │                                   │
//! │   ├──────┼──────────────────────────────┤                                   │
//! │   │ id_0 │ value, freq:2, prev/next     │                                   │
//! │   │ id_1 │ value, freq:1, prev/next     │                                   │
//! │   │ id_2 │ value, freq:1, prev/next     │                                   │
//! │   └──────┴──────────────────────────────┘                                   │
//! │                                                                             │
//! │   buckets: FxHashMap<u64, Bucket>  (frequency → doubly-linked list)         │
//! │                                                                             │
//! │   min_freq = 1                                                              │
//! │       │                                                                     │
//! │       ▼                                                                     │
//! │   freq=1: head ──► [id_2] ◄──► [id_1] ◄── tail                              │
//! │                      MRU          LRU (evict first)                         │
//! │                                                                             │
//! │   freq=2: head ──► [id_0] ◄── tail                                          │
//! │                                                                             │
//! │   Bucket links: freq=1 ──next──► freq=2                                     │
//! │                 freq=2 ◄──prev── freq=1                                     │
//! └─────────────────────────────────────────────────────────────────────────────┘
//!
//! Touch Flow (increment frequency)
//! ─────────────────────────────────
//!
//!   touch(id_1):
//!     1. Remove id_1 from freq=1 bucket list
//!     2. If freq=1 bucket empty → unlink bucket, min_freq moves to its successor
//!     3. Create freq=2 bucket if needed, linked right after freq=1
//!     4. Push id_1 to front of freq=2 bucket (MRU)
//!
//! Eviction Flow (pop_min)
//! ───────────────────────
//!
//!   pop_min():
//!     1. Use min_freq to find lowest bucket
//!     2. Pop tail of that bucket (least recently touched at that frequency)
//!     3. If bucket empty → unlink bucket, update min_freq
//!     4. Free the slot and return (value, freq)
//! ```
//!
//! ## Operations
//!
//! | Operation      | Time        | Notes                                  |
//! |----------------|-------------|----------------------------------------|
//! | `insert`       | O(1)        | New value starts at freq=1             |
//! | `touch`        | O(1)        | Increment frequency, move to MRU       |
//! | `remove`       | O(1)        | Unlink and free                        |
//! | `pop_min`      | O(1)        | Evict LFU (LRU tie-break)              |
//! | `iter`         | O(n)        | Ascending frequency, MRU first         |
//!
//! ## Example Usage
//!
//! ```
//! use crp::ds::FrequencyBuckets;
//!
//! let mut freq = FrequencyBuckets::new();
//!
//! let a = freq.insert("page_a");
//! let _b = freq.insert("page_b");
//!
//! freq.touch(a); // freq=2
//! freq.touch(a); // freq=3
//!
//! assert_eq!(freq.frequency(a), Some(3));
//! assert_eq!(freq.pop_min(), Some(("page_b", 1)));
//! ```

use rustc_hash::FxHashMap;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

/// Link pointers are touched on every operation, so they sit first.
#[derive(Debug)]
#[repr(C)]
struct Node<T> {
    prev: Option<SlotId>,
    next: Option<SlotId>,
    freq: u64,
    value: T,
}

#[derive(Debug, Default)]
struct Bucket {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    prev: Option<u64>,
    next: Option<u64>,
}

/// O(1) frequency-ordered storage with LRU tie-breaking within a frequency.
///
/// Values are addressed by the [`SlotId`] returned from [`insert`](Self::insert).
/// A handle stays valid until the value is removed or popped.
#[derive(Debug)]
pub struct FrequencyBuckets<T> {
    entries: SlotArena<Node<T>>,
    buckets: FxHashMap<u64, Bucket>,
    min_freq: u64,
}

// Most entries sit at low counts; 32 buckets covers that without regrowth.
const DEFAULT_BUCKET_PREALLOC: usize = 32;

impl<T> FrequencyBuckets<T> {
    /// Creates an empty structure.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty structure with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SlotArena::with_capacity(capacity),
            buckets: FxHashMap::with_capacity_and_hasher(
                DEFAULT_BUCKET_PREALLOC,
                Default::default(),
            ),
            min_freq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest frequency with a non-empty bucket, or `None` when empty.
    pub fn min_freq(&self) -> Option<u64> {
        if self.min_freq == 0 {
            None
        } else {
            Some(self.min_freq)
        }
    }

    pub fn frequency(&self, id: SlotId) -> Option<u64> {
        self.entries.get(id).map(|node| node.freq)
    }

    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.entries.get(id).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.entries.get_mut(id).map(|node| &mut node.value)
    }

    /// Inserts `value` at frequency 1, in front of its bucket.
    ///
    /// A fresh value is always the least frequently used, so `min_freq`
    /// becomes 1.
    pub fn insert(&mut self, value: T) -> SlotId {
        let id = self.entries.insert(Node {
            prev: None,
            next: None,
            freq: 1,
            value,
        });

        if !self.buckets.contains_key(&1) {
            let next = self.min_freq();
            self.insert_bucket(1, None, next);
        }

        self.list_push_front(1, id);
        self.min_freq = 1;
        id
    }

    /// Moves `id` from bucket `f` to the front of bucket `f + 1`.
    ///
    /// Returns the new frequency, or `None` if `id` is not live. At
    /// `u64::MAX` the value stays in its bucket and only moves to the front.
    pub fn touch(&mut self, id: SlotId) -> Option<u64> {
        let current_freq = self.entries.get(id)?.freq;
        if current_freq == u64::MAX {
            self.list_remove(current_freq, id)?;
            self.list_push_front(current_freq, id);
            return Some(current_freq);
        }
        let next_freq = current_freq + 1;

        let (prev_freq, next_existing) = {
            let bucket = self.buckets.get(&current_freq)?;
            (bucket.prev, bucket.next)
        };

        self.list_remove(current_freq, id)?;
        let bucket_empty = self.bucket_is_empty(current_freq);

        if bucket_empty {
            self.remove_bucket(current_freq, prev_freq, next_existing);
        }

        if !self.buckets.contains_key(&next_freq) {
            let prev = if bucket_empty {
                prev_freq
            } else {
                Some(current_freq)
            };
            self.insert_bucket(next_freq, prev, next_existing);
        }

        if let Some(node) = self.entries.get_mut(id) {
            node.freq = next_freq;
        }
        self.list_push_front(next_freq, id);

        if bucket_empty && self.min_freq == current_freq {
            self.min_freq = next_freq;
        }

        Some(next_freq)
    }

    /// Unlinks and frees `id`, returning its value and final frequency.
    pub fn remove(&mut self, id: SlotId) -> Option<(T, u64)> {
        let freq = self.entries.get(id)?.freq;
        self.unlink(freq, id)?;
        self.entries.remove(id).map(|node| (node.value, node.freq))
    }

    /// Returns the eviction candidate without removing it.
    pub fn peek_min(&self) -> Option<(&T, u64)> {
        let id = self.peek_min_id()?;
        self.entries.get(id).map(|node| (&node.value, node.freq))
    }

    /// Returns the handle of the eviction candidate.
    pub fn peek_min_id(&self) -> Option<SlotId> {
        self.buckets.get(&self.min_freq)?.tail
    }

    /// Removes and returns the tail of the `min_freq` bucket.
    pub fn pop_min(&mut self) -> Option<(T, u64)> {
        let id = self.peek_min_id()?;
        self.remove(id)
    }

    /// Iterates values in ascending frequency, most recently touched first
    /// within each frequency.
    pub fn iter(&self) -> FrequencyBucketsIter<'_, T> {
        let current = self.buckets.get(&self.min_freq).and_then(|b| b.head);
        FrequencyBucketsIter {
            buckets: self,
            current,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.buckets.clear();
        self.min_freq = 0;
    }

    /// Checks bucket links, per-node frequencies and `min_freq`.
    pub fn validate(&self) -> Result<(), InvariantError> {
        if self.is_empty() {
            if !self.buckets.is_empty() || self.min_freq != 0 {
                return Err(InvariantError::new("empty structure still has buckets"));
            }
            return Ok(());
        }

        let lowest = self.buckets.keys().copied().min().unwrap_or(0);
        if self.min_freq != lowest {
            return Err(InvariantError::new(format!(
                "min_freq is {} but lowest bucket is {lowest}",
                self.min_freq
            )));
        }

        let mut seen = 0usize;
        for (&freq, bucket) in &self.buckets {
            if bucket.head.is_none() || bucket.tail.is_none() {
                return Err(InvariantError::new(format!("bucket {freq} is empty")));
            }
            match bucket.prev {
                Some(prev) if self.buckets.get(&prev).and_then(|b| b.next) != Some(freq) => {
                    return Err(InvariantError::new(format!(
                        "bucket {prev} does not link forward to {freq}"
                    )));
                },
                Some(prev) if prev >= freq => {
                    return Err(InvariantError::new(format!(
                        "bucket {prev} precedes {freq} out of order"
                    )));
                },
                None if freq != self.min_freq => {
                    return Err(InvariantError::new(format!(
                        "bucket {freq} has no predecessor but is not the minimum"
                    )));
                },
                _ => {},
            }
            if let Some(next) = bucket.next
                && self.buckets.get(&next).and_then(|b| b.prev) != Some(freq)
            {
                return Err(InvariantError::new(format!(
                    "bucket {next} does not link back to {freq}"
                )));
            }

            let mut current = bucket.head;
            let mut last = None;
            while let Some(id) = current {
                let node = self.entries.get(id).ok_or_else(|| {
                    InvariantError::new(format!("bucket {freq} links to freed slot"))
                })?;
                if node.freq != freq {
                    return Err(InvariantError::new(format!(
                        "node at frequency {} sits in bucket {freq}",
                        node.freq
                    )));
                }
                if node.prev != last {
                    return Err(InvariantError::new(format!("broken back-link in bucket {freq}")));
                }
                last = Some(id);
                current = node.next;
                seen += 1;
                if seen > self.len() {
                    return Err(InvariantError::new("cycle detected in bucket lists"));
                }
            }
            if bucket.tail != last {
                return Err(InvariantError::new(format!("bucket {freq} tail is stale")));
            }
        }

        if seen != self.len() {
            return Err(InvariantError::new(format!(
                "buckets reach {seen} nodes but arena holds {}",
                self.len()
            )));
        }
        Ok(())
    }

    fn unlink(&mut self, freq: u64, id: SlotId) -> Option<()> {
        self.list_remove(freq, id)?;
        if self.bucket_is_empty(freq) {
            let (prev, next) = {
                let bucket = self.buckets.get(&freq)?;
                (bucket.prev, bucket.next)
            };
            self.remove_bucket(freq, prev, next);
            if self.min_freq == freq {
                self.min_freq = next.unwrap_or(0);
            }
        }
        Some(())
    }

    fn bucket_is_empty(&self, freq: u64) -> bool {
        self.buckets
            .get(&freq)
            .map(|bucket| bucket.head.is_none())
            .unwrap_or(true)
    }

    fn insert_bucket(&mut self, freq: u64, prev: Option<u64>, next: Option<u64>) {
        let bucket = Bucket {
            head: None,
            tail: None,
            prev,
            next,
        };
        self.buckets.insert(freq, bucket);

        if let Some(prev) = prev
            && let Some(prev_bucket) = self.buckets.get_mut(&prev)
        {
            prev_bucket.next = Some(freq);
        }
        if let Some(next) = next
            && let Some(next_bucket) = self.buckets.get_mut(&next)
        {
            next_bucket.prev = Some(freq);
        }
    }

    fn remove_bucket(&mut self, freq: u64, prev: Option<u64>, next: Option<u64>) {
        if let Some(prev) = prev
            && let Some(prev_bucket) = self.buckets.get_mut(&prev)
        {
            prev_bucket.next = next;
        }
        if let Some(next) = next
            && let Some(next_bucket) = self.buckets.get_mut(&next)
        {
            next_bucket.prev = prev;
        }
        self.buckets.remove(&freq);
    }

    fn list_push_front(&mut self, freq: u64, id: SlotId) {
        let Some(bucket) = self.buckets.get_mut(&freq) else {
            return;
        };

        let old_head = bucket.head;
        if let Some(node) = self.entries.get_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(old_head) = old_head {
            if let Some(node) = self.entries.get_mut(old_head) {
                node.prev = Some(id);
            }
        } else {
            bucket.tail = Some(id);
        }
        bucket.head = Some(id);
    }

    fn list_remove(&mut self, freq: u64, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let node = self.entries.get(id)?;
            (node.prev, node.next)
        };

        let bucket = self.buckets.get_mut(&freq)?;
        if let Some(prev) = prev {
            if let Some(node) = self.entries.get_mut(prev) {
                node.next = next;
            }
        } else {
            bucket.head = next;
        }
        if let Some(next) = next {
            if let Some(node) = self.entries.get_mut(next) {
                node.prev = prev;
            }
        } else {
            bucket.tail = prev;
        }

        if let Some(node) = self.entries.get_mut(id) {
            node.prev = None;
            node.next = None;
        }

        Some(())
    }
}

impl<T> Default for FrequencyBuckets<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Ascending-frequency iterator yielding `(SlotId, &T, freq)`.
pub struct FrequencyBucketsIter<'a, T> {
    buckets: &'a FrequencyBuckets<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for FrequencyBucketsIter<'a, T> {
    type Item = (SlotId, &'a T, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.buckets.entries.get(id)?;
        self.current = match node.next {
            Some(next) => Some(next),
            None => self
                .buckets
                .buckets
                .get(&node.freq)
                .and_then(|bucket| bucket.next)
                .and_then(|freq| self.buckets.buckets.get(&freq))
                .and_then(|bucket| bucket.head),
        };
        Some((id, &node.value, node.freq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order<T: Copy>(buckets: &FrequencyBuckets<T>) -> Vec<(T, u64)> {
        buckets.iter().map(|(_, v, f)| (*v, f)).collect()
    }

    #[test]
    fn insert_starts_at_frequency_one() {
        let mut buckets = FrequencyBuckets::new();
        let a = buckets.insert("a");
        assert_eq!(buckets.frequency(a), Some(1));
        assert_eq!(buckets.min_freq(), Some(1));
        assert_eq!(buckets.len(), 1);
        buckets.validate().unwrap();
    }

    #[test]
    fn touch_moves_one_level_at_a_time() {
        let mut buckets = FrequencyBuckets::new();
        let a = buckets.insert("a");
        assert_eq!(buckets.touch(a), Some(2));
        assert_eq!(buckets.touch(a), Some(3));
        assert_eq!(buckets.touch(a), Some(4));
        assert_eq!(buckets.frequency(a), Some(4));
        assert_eq!(buckets.min_freq(), Some(4));
        buckets.validate().unwrap();
    }

    #[test]
    fn min_freq_follows_emptied_bucket() {
        let mut buckets = FrequencyBuckets::new();
        let a = buckets.insert("a");
        let b = buckets.insert("b");

        buckets.touch(a);
        assert_eq!(buckets.min_freq(), Some(1));

        buckets.touch(b);
        assert_eq!(buckets.min_freq(), Some(2));

        buckets.insert("c");
        assert_eq!(buckets.min_freq(), Some(1));
        buckets.validate().unwrap();
    }

    #[test]
    fn pop_min_takes_least_recent_of_lowest_bucket() {
        let mut buckets = FrequencyBuckets::new();
        let a = buckets.insert("a");
        buckets.insert("b");
        buckets.insert("c");
        buckets.touch(a);

        assert_eq!(buckets.peek_min(), Some((&"b", 1)));
        assert_eq!(buckets.pop_min(), Some(("b", 1)));
        assert_eq!(buckets.pop_min(), Some(("c", 1)));
        assert_eq!(buckets.min_freq(), Some(2));
        assert_eq!(buckets.pop_min(), Some(("a", 2)));
        assert_eq!(buckets.pop_min(), None);
        assert_eq!(buckets.min_freq(), None);
        buckets.validate().unwrap();
    }

    #[test]
    fn iter_is_ascending_frequency_then_recency() {
        let mut buckets = FrequencyBuckets::new();
        let one = buckets.insert("1");
        let two = buckets.insert("2");
        let three = buckets.insert("3");
        assert_eq!(order(&buckets), vec![("3", 1), ("2", 1), ("1", 1)]);

        buckets.touch(one);
        assert_eq!(order(&buckets), vec![("3", 1), ("2", 1), ("1", 2)]);

        buckets.touch(two);
        buckets.touch(three);
        assert_eq!(order(&buckets), vec![("3", 2), ("2", 2), ("1", 2)]);

        buckets.touch(two);
        assert_eq!(order(&buckets), vec![("3", 2), ("1", 2), ("2", 3)]);
    }

    #[test]
    fn remove_middle_bucket_relinks_neighbours() {
        let mut buckets = FrequencyBuckets::new();
        let a = buckets.insert("a");
        let b = buckets.insert("b");
        let c = buckets.insert("c");
        buckets.touch(b);
        buckets.touch(c);
        buckets.touch(c);

        assert_eq!(buckets.remove(b), Some(("b", 2)));
        assert_eq!(order(&buckets), vec![("a", 1), ("c", 3)]);
        buckets.validate().unwrap();

        assert_eq!(buckets.remove(a), Some(("a", 1)));
        assert_eq!(buckets.min_freq(), Some(3));
        assert_eq!(buckets.remove(a), None);
        buckets.validate().unwrap();
    }

    #[test]
    fn get_mut_keeps_position() {
        let mut buckets = FrequencyBuckets::new();
        let a = buckets.insert(1);
        buckets.insert(2);
        if let Some(value) = buckets.get_mut(a) {
            *value = 10;
        }
        assert_eq!(buckets.get(a), Some(&10));
        assert_eq!(order(&buckets), vec![(2, 1), (10, 1)]);
    }

    #[test]
    fn touch_saturates_at_max() {
        let mut buckets = FrequencyBuckets::new();
        let a = buckets.insert("a");
        let b = buckets.insert("b");
        buckets.touch(a);

        // re-home `a` in a top bucket by hand
        buckets.unlink(2, a).unwrap();
        buckets.insert_bucket(u64::MAX, Some(1), None);
        if let Some(node) = buckets.entries.get_mut(a) {
            node.freq = u64::MAX;
        }
        buckets.list_push_front(u64::MAX, a);
        buckets.validate().unwrap();

        assert_eq!(buckets.touch(a), Some(u64::MAX));
        assert_eq!(buckets.frequency(a), Some(u64::MAX));
        assert_eq!(buckets.frequency(b), Some(1));
        buckets.validate().unwrap();
    }

    #[test]
    fn clear_resets_min() {
        let mut buckets = FrequencyBuckets::with_capacity(4);
        let a = buckets.insert(1);
        buckets.touch(a);
        buckets.clear();
        assert!(buckets.is_empty());
        assert_eq!(buckets.min_freq(), None);
        assert_eq!(buckets.get(a), None);
        assert_eq!(buckets.iter().count(), 0);
        buckets.validate().unwrap();
    }
}
