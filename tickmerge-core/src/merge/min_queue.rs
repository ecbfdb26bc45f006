//! Generic min-priority queue with a caller-supplied key extractor.
//!
//! `BinaryHeap` is a max-heap, so entries order themselves in reverse.
//! Each entry also carries an insertion sequence number: items with equal
//! keys pop in the order they were pushed, which keeps output deterministic
//! without the item type having to define a total order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct Entry<K, T> {
    key: K,
    seq: u64,
    item: T,
}

impl<K: Ord, T> PartialEq for Entry<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.seq == other.seq
    }
}

impl<K: Ord, T> Eq for Entry<K, T> {}

impl<K: Ord, T> PartialOrd for Entry<K, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, T> Ord for Entry<K, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-queue ordered by `key_fn(&item)`.
pub struct MinQueue<T, K, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    heap: BinaryHeap<Entry<K, T>>,
    key_fn: F,
    next_seq: u64,
    peak_len: usize,
}

impl<T, K, F> MinQueue<T, K, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    pub fn new(key_fn: F) -> Self {
        Self::with_capacity(0, key_fn)
    }

    pub fn with_capacity(capacity: usize, key_fn: F) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            key_fn,
            next_seq: 0,
            peak_len: 0,
        }
    }

    pub fn push(&mut self, item: T) {
        let key = (self.key_fn)(&item);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { key, seq, item });
        self.peak_len = self.peak_len.max(self.heap.len());
    }

    /// Remove and return the item with the smallest key.
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|e| e.item)
    }

    pub fn peek(&self) -> Option<&T> {
        self.heap.peek().map(|e| &e.item)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Largest length the queue has reached.
    pub fn peak_len(&self) -> usize {
        self.peak_len
    }
}

impl<T, K, F> Extend<T> for MinQueue<T, K, F>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_ascending_key_order() {
        let mut q = MinQueue::new(|x: &i32| *x);
        q.extend([5, 1, 4, 2, 3]);
        let out: Vec<i32> = std::iter::from_fn(|| q.pop()).collect();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
        assert!(q.is_empty());
    }

    #[test]
    fn equal_keys_pop_in_insertion_order() {
        let mut q = MinQueue::new(|x: &(u8, char)| x.0);
        q.push((1, 'a'));
        q.push((0, 'z'));
        q.push((1, 'b'));
        q.push((1, 'c'));
        assert_eq!(q.pop().unwrap().1, 'z');
        assert_eq!(q.pop().unwrap().1, 'a');
        assert_eq!(q.pop().unwrap().1, 'b');
        assert_eq!(q.pop().unwrap().1, 'c');
    }

    #[test]
    fn key_fn_selects_the_field() {
        // Order by the second field only.
        let mut q = MinQueue::new(|x: &(i32, i32)| x.1);
        q.extend([(1, 30), (2, 10), (3, 20)]);
        assert_eq!(q.peek(), Some(&(2, 10)));
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn tracks_peak_length() {
        let mut q = MinQueue::new(|x: &u32| *x);
        q.extend([3, 2, 1]);
        q.pop();
        q.pop();
        q.push(9);
        assert_eq!(q.len(), 2);
        assert_eq!(q.peak_len(), 3);
    }
}
