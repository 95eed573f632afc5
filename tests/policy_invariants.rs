// ==============================================
// CROSS-POLICY INVARIANT TESTS (integration)
// ==============================================
//
// Behavioral properties that every eviction policy must share, plus
// reference-model checks for the ordered policies. These span multiple
// modules and belong here rather than in any single source file.

use proptest::prelude::*;
use stashkit::builder::{CacheBuilder, CachePolicy, PolicyStore};
use stashkit::policy::fifo::FifoCache;
use stashkit::policy::lfu::LfuCache;
use stashkit::policy::lru::LruCache;
use stashkit::policy::two_segment::{Segment, TwoSegmentCache};
use stashkit::traits::EvictionStore;

#[derive(Debug, Clone)]
enum Operation {
    Insert(u32, u32),
    Get(u32),
    Remove(u32),
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (0u32..40, 0u32..100).prop_map(|(k, v)| Operation::Insert(k, v)),
        (0u32..40).prop_map(Operation::Get),
        (0u32..40).prop_map(Operation::Remove),
    ]
}

fn policy_strategy() -> impl Strategy<Value = CachePolicy> {
    prop_oneof![
        Just(CachePolicy::Fifo),
        Just(CachePolicy::Lru),
        Just(CachePolicy::Lfu),
        (1usize..10).prop_map(|protected_capacity| CachePolicy::TwoSegment { protected_capacity }),
    ]
}

fn apply<S: EvictionStore<u32, u32>>(store: &mut S, op: &Operation) {
    match *op {
        Operation::Insert(k, v) => {
            store.insert(k, v);
        },
        Operation::Get(k) => {
            store.get(&k);
        },
        Operation::Remove(k) => {
            store.remove(&k);
        },
    }
}

// ==============================================
// Capacity-0 Behavior
// ==============================================

mod zero_capacity {
    use super::*;

    #[test]
    fn every_policy_rejects_zero_capacity() {
        assert!(LruCache::<u32, u32>::try_new(0).is_err());
        assert!(FifoCache::<u32, u32>::try_new(0).is_err());
        assert!(LfuCache::<u32, u32>::try_new(0).is_err());
        assert!(TwoSegmentCache::<u32, u32>::try_new(0, 1).is_err());
        assert!(TwoSegmentCache::<u32, u32>::try_new(1, 0).is_err());
    }
}

// ==============================================
// Shared properties
// ==============================================

proptest! {
    /// len() never exceeds capacity, whatever the policy.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_len_within_capacity(
        capacity in 1usize..20,
        policy in policy_strategy(),
        ops in prop::collection::vec(operation_strategy(), 0..200)
    ) {
        let mut store: PolicyStore<u32, u32> =
            CacheBuilder::new(capacity).try_build(policy).unwrap();
        for op in &ops {
            apply(&mut store, op);
            prop_assert!(store.len() <= store.capacity());
        }
    }

    /// keys() lists exactly the resident keys, and the two directions mirror
    /// each other.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_keys_match_contents(
        capacity in 1usize..20,
        policy in policy_strategy(),
        ops in prop::collection::vec(operation_strategy(), 0..150)
    ) {
        let mut store: PolicyStore<u32, u32> =
            CacheBuilder::new(capacity).try_build(policy).unwrap();
        for op in &ops {
            apply(&mut store, op);
        }

        let oldest_first = store.keys(true);
        let mut newest_first = store.keys(false);
        prop_assert_eq!(oldest_first.len(), store.len());
        for key in &oldest_first {
            prop_assert!(store.contains(key));
        }
        newest_first.reverse();
        prop_assert_eq!(oldest_first, newest_first);
    }

    /// A value read back right after insertion is the inserted value.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_get_after_insert(
        capacity in 1usize..20,
        policy in policy_strategy(),
        prefix in prop::collection::vec(operation_strategy(), 0..50),
        key in 0u32..40,
        value in 0u32..1000
    ) {
        let mut store: PolicyStore<u32, u32> =
            CacheBuilder::new(capacity).try_build(policy).unwrap();
        for op in &prefix {
            apply(&mut store, op);
        }
        store.insert(key, value);
        prop_assert_eq!(store.get(&key), Some(&value));
    }

    /// Removing a key makes it absent; removing it again is a no-op.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_remove_is_idempotent(
        capacity in 1usize..20,
        policy in policy_strategy(),
        ops in prop::collection::vec(operation_strategy(), 0..100),
        key in 0u32..40
    ) {
        let mut store: PolicyStore<u32, u32> =
            CacheBuilder::new(capacity).try_build(policy).unwrap();
        for op in &ops {
            apply(&mut store, op);
        }
        let len = store.len();
        let removed = store.remove(&key);
        prop_assert_eq!(store.len(), len - usize::from(removed.is_some()));
        prop_assert!(!store.contains(&key));
        prop_assert_eq!(store.remove(&key), None);
    }

    /// clear() empties the store, and clearing again changes nothing.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_clear_is_idempotent(
        capacity in 1usize..20,
        policy in policy_strategy(),
        ops in prop::collection::vec(operation_strategy(), 0..100)
    ) {
        let mut store: PolicyStore<u32, u32> =
            CacheBuilder::new(capacity).try_build(policy).unwrap();
        for op in &ops {
            apply(&mut store, op);
        }
        let capacity = store.capacity();

        store.clear();
        prop_assert_eq!(store.len(), 0);
        prop_assert!(store.keys(true).is_empty());
        store.clear();
        prop_assert_eq!(store.len(), 0);
        prop_assert_eq!(store.capacity(), capacity);

        // still usable afterwards
        store.insert(1, 1);
        prop_assert_eq!(store.get(&1), Some(&1));
    }
}

// ==============================================
// Reference models
// ==============================================

proptest! {
    /// LRU agrees with a vector kept in recency order.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_lru_matches_model(
        capacity in 1usize..12,
        ops in prop::collection::vec(operation_strategy(), 0..200)
    ) {
        let mut cache = LruCache::try_new(capacity).unwrap();
        // front = least recent
        let mut model: Vec<(u32, u32)> = Vec::new();

        for op in &ops {
            match *op {
                Operation::Insert(k, v) => {
                    let expected = if let Some(pos) = model.iter().position(|(mk, _)| *mk == k) {
                        model.remove(pos);
                        None
                    } else if model.len() == capacity {
                        Some(model.remove(0))
                    } else {
                        None
                    };
                    model.push((k, v));
                    prop_assert_eq!(cache.insert(k, v), expected);
                },
                Operation::Get(k) => {
                    let expected = model.iter().position(|(mk, _)| *mk == k).map(|pos| {
                        let entry = model.remove(pos);
                        model.push(entry);
                        entry.1
                    });
                    prop_assert_eq!(cache.get(&k).copied(), expected);
                },
                Operation::Remove(k) => {
                    let expected = model
                        .iter()
                        .position(|(mk, _)| *mk == k)
                        .map(|pos| model.remove(pos).1);
                    prop_assert_eq!(cache.remove(&k), expected);
                },
            }
            cache.debug_validate_invariants();
        }

        let keys: Vec<u32> = model.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(cache.keys(true), keys);
    }

    /// FIFO agrees with a vector kept in first-insertion order.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_fifo_matches_model(
        capacity in 1usize..12,
        ops in prop::collection::vec(operation_strategy(), 0..200)
    ) {
        let mut cache = FifoCache::try_new(capacity).unwrap();
        // front = oldest
        let mut model: Vec<(u32, u32)> = Vec::new();

        for op in &ops {
            match *op {
                Operation::Insert(k, v) => {
                    let expected = if let Some(entry) = model.iter_mut().find(|(mk, _)| *mk == k) {
                        entry.1 = v;
                        None
                    } else {
                        let evicted = (model.len() == capacity).then(|| model.remove(0));
                        model.push((k, v));
                        evicted
                    };
                    prop_assert_eq!(cache.insert(k, v), expected);
                },
                Operation::Get(k) => {
                    let expected = model.iter().find(|(mk, _)| *mk == k).map(|(_, v)| *v);
                    prop_assert_eq!(cache.get(&k).copied(), expected);
                },
                Operation::Remove(k) => {
                    let expected = model
                        .iter()
                        .position(|(mk, _)| *mk == k)
                        .map(|pos| model.remove(pos).1);
                    prop_assert_eq!(cache.remove(&k), expected);
                },
            }
        }

        let keys: Vec<u32> = model.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(cache.keys(true), keys);
        cache.debug_validate_invariants();
    }

    /// LFU frequencies equal one plus the number of hits and updates since
    /// admission, a newly admitted key is never its own victim, and the
    /// victim always holds the lowest frequency.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_lfu_counts_accesses(
        capacity in 1usize..12,
        ops in prop::collection::vec(operation_strategy(), 0..200)
    ) {
        let mut cache = LfuCache::try_new(capacity).unwrap();
        let mut counts = std::collections::HashMap::new();

        for op in &ops {
            match *op {
                Operation::Insert(k, v) => {
                    let was_present = cache.contains(&k);
                    let lowest = counts.values().min().copied();
                    if let Some((victim, _)) = cache.insert(k, v) {
                        prop_assert_ne!(victim, k);
                        // no resident key had a strictly lower frequency
                        prop_assert_eq!(counts.remove(&victim), lowest);
                    }
                    prop_assert!(cache.contains(&k));
                    if was_present {
                        *counts.entry(k).or_insert(0u64) += 1;
                    } else {
                        counts.insert(k, 1);
                    }
                },
                Operation::Get(k) => {
                    if cache.get(&k).is_some() {
                        *counts.entry(k).or_insert(0) += 1;
                    }
                },
                Operation::Remove(k) => {
                    cache.remove(&k);
                    counts.remove(&k);
                },
            }
            cache.debug_validate_invariants();
        }

        for (key, count) in &counts {
            prop_assert_eq!(cache.frequency(key), Some(*count));
        }
        prop_assert_eq!(counts.len(), cache.len());
    }

    /// Two-segment: no key lives in both segments, writes never promote, and
    /// a probation hit always promotes.
    #[cfg_attr(miri, ignore)]
    #[test]
    fn prop_two_segment_promotion(
        probation in 1usize..8,
        protected in 1usize..8,
        ops in prop::collection::vec(operation_strategy(), 0..200)
    ) {
        let mut cache = TwoSegmentCache::try_new(probation, protected).unwrap();

        for op in &ops {
            match *op {
                Operation::Insert(k, v) => {
                    let before = cache.segment_of(&k);
                    cache.insert(k, v);
                    let expected = before.unwrap_or(Segment::Probation);
                    prop_assert_eq!(cache.segment_of(&k), Some(expected));
                },
                Operation::Get(k) => {
                    let before = cache.segment_of(&k);
                    let hit = cache.get(&k).is_some();
                    prop_assert_eq!(hit, before.is_some());
                    if hit {
                        prop_assert_eq!(cache.segment_of(&k), Some(Segment::Protected));
                    }
                },
                Operation::Remove(k) => {
                    cache.remove(&k);
                    prop_assert_eq!(cache.segment_of(&k), None);
                },
            }
            cache.debug_validate_invariants();
            prop_assert!(cache.probation_len() <= probation);
            prop_assert!(cache.protected_len() <= protected);
        }
    }
}
