// ==============================================
// SHARED CACHE CONCURRENCY TESTS (integration)
// ==============================================
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use stashkit::builder::{CacheBuilder, CachePolicy};
use stashkit::clock::ManualClock;
use stashkit::expire::Expiration;
use stashkit::guard::SharedCache;
use stashkit::policy::lru::LruCache;

const POLICIES: [CachePolicy; 4] = [
    CachePolicy::Fifo,
    CachePolicy::Lru,
    CachePolicy::Lfu,
    CachePolicy::TwoSegment {
        protected_capacity: 32,
    },
];

mod mixed_workload {
    use super::*;

    #[test]
    fn test_len_never_exceeds_capacity() {
        for policy in POLICIES {
            let store = CacheBuilder::new(32).try_build::<String, usize>(policy).unwrap();
            let cache = SharedCache::new(store);
            let capacity = cache.capacity();
            let num_threads = 8;
            let operations_per_thread = 500;
            let violations = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (0..num_threads)
                .map(|thread_id| {
                    let cache = cache.clone();
                    let violations = violations.clone();

                    thread::spawn(move || {
                        for i in 0..operations_per_thread {
                            let key = format!("thread_{}_{}", thread_id, i % 64);
                            match i % 4 {
                                0 | 1 => {
                                    cache.insert(key, i);
                                },
                                2 => {
                                    let _ = cache.get(&key);
                                },
                                _ => {
                                    if i % 20 == 3 {
                                        cache.remove(&key);
                                    } else {
                                        let _ = cache.contains(&key);
                                    }
                                },
                            }
                            if cache.len() > capacity {
                                violations.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(violations.load(Ordering::SeqCst), 0, "{policy:?}");
            assert!(cache.len() <= capacity);
            assert_eq!(cache.keys(true).len(), cache.len());
        }
    }

    #[test]
    fn test_get_or_insert_with_initializes_once_per_key() {
        let cache = SharedCache::new(LruCache::try_new(128).unwrap());
        let init_calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let init_calls = init_calls.clone();
                thread::spawn(move || {
                    for key in 0..50u32 {
                        let value = cache.get_or_insert_with(key, || {
                            init_calls.fetch_add(1, Ordering::SeqCst);
                            key * 2
                        });
                        assert_eq!(value, key * 2);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(init_calls.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn test_stats_account_for_every_lookup() {
        let cache = SharedCache::new(LruCache::try_new(16).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..100u32 {
                        cache.insert((t, i % 8), i);
                        let _ = cache.get(&(t, (i + 1) % 8));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.total_accesses(), 400);
        assert_eq!(stats.inserts, 400);
    }
}

mod expiry_races {
    use super::*;

    /// Writers keep overwriting a small key set while time moves; a stale
    /// wake-up must never expire an entry younger than the live timeout.
    #[test]
    fn test_overwrite_races_never_expire_fresh_entries() {
        let clock = ManualClock::new();
        let cache = SharedCache::with_clock(
            LruCache::try_new(16).unwrap(),
            Some(Expiration::live(Duration::from_millis(100))),
            clock.clone(),
        );
        let stop = Arc::new(AtomicBool::new(false));

        let ticker = {
            let clock = clock.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    clock.advance_millis(7);
                    thread::yield_now();
                }
            })
        };

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..2_000u32 {
                        let key = (t * 4 + i % 4) as u8;
                        cache.insert(key, i);
                        // keys are private to each writer
                        if let Some(value) = cache.get(&key) {
                            assert_eq!(value, i);
                        }
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }
        stop.store(true, Ordering::SeqCst);
        ticker.join().unwrap();

        assert!(cache.len() <= 16);
    }

    #[test]
    fn test_reaper_drains_idle_cache_in_real_time() {
        for policy in POLICIES {
            let store = CacheBuilder::new(64).try_build::<u32, u32>(policy).unwrap();
            let cache = SharedCache::expiring(store, Expiration::idle(Duration::from_millis(30)));
            for i in 0..40 {
                cache.insert(i, i);
            }

            let deadline = Instant::now() + Duration::from_secs(5);
            while cache.stats().expirations < 40 && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            assert_eq!(cache.stats().expirations, 40, "{policy:?}");
            assert!(cache.is_empty());
        }
    }

    #[test]
    fn test_reads_keep_idle_entries_alive_across_threads() {
        let cache = SharedCache::expiring(
            LruCache::try_new(8).unwrap(),
            Expiration::idle(Duration::from_millis(150)),
        );
        cache.insert("hot", 1);
        cache.insert("cold", 2);

        let reader = {
            let cache = cache.clone();
            thread::spawn(move || {
                let until = Instant::now() + Duration::from_millis(450);
                while Instant::now() < until {
                    assert_eq!(cache.get(&"hot"), Some(1));
                    thread::sleep(Duration::from_millis(20));
                }
            })
        };
        reader.join().unwrap();

        assert!(cache.contains(&"hot"));
        assert!(!cache.contains(&"cold"));
    }
}
