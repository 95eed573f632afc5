//! Indexed binary min-heap with in-place score updates.
//!
//! Unlike a lazy heap, every key has exactly one heap slot. A side index maps
//! `key -> position`, so changing a key's score re-heapifies that one entry
//! (sift up or down) instead of pushing a duplicate. This is what the LFU
//! policy uses to keep its frequency ordering exact.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                        IndexedMinHeap Layout                          │
//! │                                                                       │
//! │   positions: FxHashMap<K, usize>       heap: Vec<HeapSlot<K, S>>      │
//! │                                                                       │
//! │     ┌───────┬─────┐                    idx  key   score  seq        │
//! │     │ "a"   │  2  │ ─────────────┐     ┌───┬─────┬──────┬─────┐      │
//! │     │ "b"   │  0  │ ──────┐      │     │ 0 │ "b" │  1   │  1  │ min  │
//! │     │ "c"   │  1  │ ───┐  │      │     │ 1 │ "c" │  3   │  2  │      │
//! │     └───────┴─────┘    │  │      │     │ 2 │ "a" │  4   │  0  │      │
//! │                        │  └──────┼───► └───┴─────┴──────┴─────┘      │
//! │                        └─────────┘                                    │
//! │                                                                       │
//! │   Ordering: (score, seq). `seq` is assigned on first insertion, so    │
//! │   among equal scores the longest-resident key sorts first.            │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation   | Description                          | Complexity |
//! |-------------|--------------------------------------|------------|
//! | `update`    | Insert or change a key's score       | O(log n)   |
//! | `remove`    | Remove a key from anywhere           | O(log n)   |
//! | `pop_best`  | Remove and return the minimum        | O(log n)   |
//! | `peek_best` | Inspect the minimum                  | O(1)       |
//! | `score_of`  | Current score for a key              | O(1)       |
//!
//! ## Example Usage
//!
//! ```
//! use stashkit::ds::IndexedMinHeap;
//!
//! let mut heap: IndexedMinHeap<&str, u64> = IndexedMinHeap::new();
//! heap.update("a", 5);
//! heap.update("b", 2);
//! heap.update("a", 1);
//!
//! assert_eq!(heap.len(), 2);
//! assert_eq!(heap.pop_best(), Some(("a", 1)));
//! assert_eq!(heap.pop_best(), Some(("b", 2)));
//! assert_eq!(heap.pop_best(), None);
//! ```
//!
//! ## Thread Safety
//!
//! Not thread-safe; callers wrap it in their own lock.

use std::hash::Hash;

use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct HeapSlot<K, S> {
    key: K,
    score: S,
    seq: u64,
}

impl<K, S: Ord> HeapSlot<K, S> {
    fn precedes(&self, other: &Self) -> bool {
        (&self.score, self.seq) < (&other.score, other.seq)
    }
}

/// Binary min-heap keyed by `K`, ordered by score `S`.
#[derive(Debug)]
pub struct IndexedMinHeap<K, S> {
    heap: Vec<HeapSlot<K, S>>,
    positions: FxHashMap<K, usize>,
    next_seq: u64,
}

impl<K, S> IndexedMinHeap<K, S>
where
    K: Eq + Hash + Clone,
    S: Ord + Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            positions: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    pub fn score_of(&self, key: &K) -> Option<&S> {
        let &pos = self.positions.get(key)?;
        self.heap.get(pos).map(|slot| &slot.score)
    }

    /// Sets `key`'s score, inserting the key if needed.
    ///
    /// Returns the previous score.
    pub fn update(&mut self, key: K, score: S) -> Option<S> {
        if let Some(&pos) = self.positions.get(&key) {
            let previous = std::mem::replace(&mut self.heap[pos].score, score);
            self.restore(pos);
            return Some(previous);
        }

        let pos = self.heap.len();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.positions.insert(key.clone(), pos);
        self.heap.push(HeapSlot { key, score, seq });
        self.sift_up(pos);
        None
    }

    /// Applies `f` to `key`'s score in place and re-heapifies.
    pub fn modify<F>(&mut self, key: &K, f: F) -> Option<&S>
    where
        F: FnOnce(&mut S),
    {
        let pos = *self.positions.get(key)?;
        f(&mut self.heap[pos].score);
        let pos = self.restore(pos);
        self.heap.get(pos).map(|slot| &slot.score)
    }

    pub fn remove(&mut self, key: &K) -> Option<S> {
        let pos = self.positions.remove(key)?;
        let last = self.heap.len() - 1;
        self.heap.swap(pos, last);
        let removed = self.heap.pop()?;
        if pos < self.heap.len() {
            let moved_key = self.heap[pos].key.clone();
            self.positions.insert(moved_key, pos);
            self.restore(pos);
        }
        Some(removed.score)
    }

    pub fn peek_best(&self) -> Option<(&K, &S)> {
        self.heap.first().map(|slot| (&slot.key, &slot.score))
    }

    pub fn pop_best(&mut self) -> Option<(K, S)> {
        let key = self.heap.first()?.key.clone();
        let score = self.remove(&key)?;
        Some((key, score))
    }

    /// Iterates entries in heap-array order (not sorted).
    pub fn iter(&self) -> impl Iterator<Item = (&K, &S)> {
        self.heap.iter().map(|slot| (&slot.key, &slot.score))
    }

    /// Snapshot of keys ordered by `(score, residency)` ascending.
    pub fn sorted_keys(&self) -> Vec<K> {
        let mut slots: Vec<&HeapSlot<K, S>> = self.heap.iter().collect();
        slots.sort_by(|a, b| (&a.score, a.seq).cmp(&(&b.score, b.seq)));
        slots.into_iter().map(|slot| slot.key.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.positions.clear();
    }

    fn restore(&mut self, pos: usize) -> usize {
        let pos = self.sift_up(pos);
        self.sift_down(pos)
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.heap[pos].precedes(&self.heap[parent]) {
                break;
            }
            self.swap_slots(pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < len && self.heap[left].precedes(&self.heap[smallest]) {
                smallest = left;
            }
            if right < len && self.heap[right].precedes(&self.heap[smallest]) {
                smallest = right;
            }
            if smallest == pos {
                return pos;
            }
            self.swap_slots(pos, smallest);
            pos = smallest;
        }
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        if let Some(p) = self.positions.get_mut(&self.heap[a].key) {
            *p = a;
        }
        if let Some(p) = self.positions.get_mut(&self.heap[b].key) {
            *p = b;
        }
    }

    /// Panics if the heap property or the position index is violated.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.heap.len(), self.positions.len());
        for (idx, slot) in self.heap.iter().enumerate() {
            assert_eq!(self.positions.get(&slot.key), Some(&idx));
            if idx > 0 {
                let parent = (idx - 1) / 2;
                assert!(!slot.precedes(&self.heap[parent]));
            }
        }
    }
}

impl<K, S> Default for IndexedMinHeap<K, S>
where
    K: Eq + Hash + Clone,
    S: Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
