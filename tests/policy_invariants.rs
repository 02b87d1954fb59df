// ==============================================
// CROSS-POLICY INVARIANT TESTS (integration)
// ==============================================
//
// Behavior every replacement policy must share, driven through the public
// `ReplacementPolicy` contract and the builder.

use crp::builder::{Cache, CacheBuilder, CachePolicy};
use crp::entry::Record;
use crp::error::CacheError;
use crp::traits::{CacheEntry, FrequencyEntry, ReplacementPolicy};

const POLICIES: [CachePolicy; 2] = [CachePolicy::Lru, CachePolicy::Lfu];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn cache(policy: CachePolicy, capacity: usize) -> Cache<Record<String>> {
    init_tracing();
    CacheBuilder::new(capacity)
        .entry_factory(Record::new)
        .build(policy)
        .unwrap()
}

// ==============================================
// Construction
// ==============================================

mod construction {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected_by_every_policy() {
        for policy in POLICIES {
            let err = CacheBuilder::<Record<i32>>::new(0)
                .entry_factory(Record::new)
                .build(policy)
                .unwrap_err();
            assert_eq!(err, CacheError::InvalidCapacity, "{policy:?}");
        }
    }

    #[test]
    fn missing_factory_is_rejected_by_every_policy() {
        for policy in POLICIES {
            let err = CacheBuilder::<Record<i32>>::new(4)
                .build(policy)
                .unwrap_err();
            assert!(
                matches!(err, CacheError::Construction(_)),
                "{policy:?} returned {err}"
            );
        }
    }
}

// ==============================================
// Capacity Bound
// ==============================================
//
// Size never exceeds capacity; an evicting put leaves size == capacity.

mod capacity_bound {
    use super::*;

    #[test]
    fn size_never_exceeds_capacity() {
        for policy in POLICIES {
            let cache = cache(policy, 5);
            for i in 0..50 {
                cache.put(&format!("k{}", i % 13), i.to_string()).unwrap();
                if i % 3 == 0 {
                    let _ = cache.get(&format!("k{}", i % 7));
                }
                assert!(cache.len() <= 5, "{policy:?} grew to {}", cache.len());
                cache.check_invariants().unwrap();
            }
            assert_eq!(cache.len(), 5);
        }
    }

    #[test]
    fn evicting_put_keeps_size_at_capacity() {
        for policy in POLICIES {
            let cache = cache(policy, 3);
            for key in ["a", "b", "c"] {
                cache.put(key, key.to_string()).unwrap();
            }
            cache.put("d", "d".to_string()).unwrap();
            assert_eq!(cache.len(), 3, "{policy:?}");
            assert!(cache.contains("d"));
        }
    }
}

// ==============================================
// Idempotent Update
// ==============================================

mod idempotent_update {
    use super::*;

    #[test]
    fn update_keeps_size_and_returns_new_value() {
        for policy in POLICIES {
            let cache = cache(policy, 3);
            cache.put("a", "1".to_string()).unwrap();
            cache.put("b", "2".to_string()).unwrap();

            cache.put("a", "10".to_string()).unwrap();
            cache.put("a", "100".to_string()).unwrap();

            assert_eq!(cache.len(), 2, "{policy:?}");
            assert_eq!(cache.get("a"), Ok("100".to_string()), "{policy:?}");
        }
    }
}

// ==============================================
// Miss Behavior
// ==============================================

mod miss_behavior {
    use super::*;

    #[test]
    fn miss_is_not_found_and_mutates_nothing() {
        for policy in POLICIES {
            let cache = cache(policy, 3);
            cache.put("a", "1".to_string()).unwrap();
            cache.put("b", "2".to_string()).unwrap();
            cache.get("a").unwrap();
            let before = cache.snapshot();

            assert_eq!(cache.get("zzz"), Err(CacheError::NotFound), "{policy:?}");
            assert_eq!(cache.snapshot(), before, "{policy:?}");
            assert_eq!(cache.len(), 2);
        }
    }

    #[test]
    fn snapshot_does_not_record_access() {
        for policy in POLICIES {
            let cache = cache(policy, 2);
            cache.put("a", "a".to_string()).unwrap();
            cache.put("b", "b".to_string()).unwrap();
            for _ in 0..5 {
                let _ = cache.snapshot();
            }
            // "a" is still the victim under both policies
            cache.put("c", "c".to_string()).unwrap();
            assert!(!cache.contains("a"), "{policy:?}");
        }
    }
}

// ==============================================
// Documented Scenarios
// ==============================================

mod scenarios {
    use super::*;
    use crp::policy::lfu::LfuCache;
    use crp::policy::lru::LruCache;

    #[test]
    fn lru_recency_law() {
        let cache = LruCache::new(3, Record::new).unwrap();
        cache.put("k1", "k1").unwrap();
        cache.put("k2", "k2").unwrap();
        cache.put("k3", "k3").unwrap();
        assert_eq!(cache.snapshot(), ["k3", "k2", "k1"]);

        assert_eq!(cache.get("k1"), Ok("k1"));
        assert_eq!(cache.snapshot(), ["k1", "k3", "k2"]);

        cache.put("k4", "k4").unwrap();
        assert_eq!(cache.snapshot(), ["k4", "k1", "k3"]);
    }

    #[test]
    fn lfu_minimum_tracking() {
        let cache = LfuCache::new(3, Record::new).unwrap();
        let freqs =
            |cache: &LfuCache<Record<&'static str>>| cache.snapshot_with(|e, _| e.frequency());

        cache.put("1", "1").unwrap();
        cache.put("2", "2").unwrap();
        cache.put("3", "3").unwrap();
        assert_eq!(cache.snapshot(), ["3", "2", "1"]);
        assert_eq!(freqs(&cache), [1, 1, 1]);

        cache.get("1").unwrap();
        assert_eq!(cache.snapshot(), ["3", "2", "1"]);
        assert_eq!(freqs(&cache), [1, 1, 2]);

        cache.get("2").unwrap();
        cache.get("3").unwrap();
        assert_eq!(cache.snapshot(), ["3", "2", "1"]);
        assert_eq!(freqs(&cache), [2, 2, 2]);

        cache.put("4", "4").unwrap();
        assert_eq!(cache.snapshot(), ["4", "3", "2"]);
        assert_eq!(freqs(&cache), [1, 2, 2]);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn entry_keys_match_index() {
        for policy in POLICIES {
            let cache = cache(policy, 4);
            for key in ["w", "x", "y", "z"] {
                cache.put(key, key.to_uppercase()).unwrap();
            }
            for key in ["w", "x", "y", "z"] {
                let entry = cache.remove(key).unwrap();
                assert_eq!(entry.key(), key);
                assert_eq!(*entry.value(), key.to_uppercase());
            }
            assert!(cache.is_empty());
        }
    }
}

// ==============================================
// Caller Panics
// ==============================================
//
// Panics in caller-supplied code surface as errors. A panicking factory or
// `set_value` leaves the cache exactly as it was.

mod caller_panics {
    use super::*;

    #[test]
    fn panicking_factory_is_reported_not_propagated() {
        for policy in POLICIES {
            let cache = CacheBuilder::<Record<i32>>::new(2)
                .entry_factory(|key: &str, value: i32| {
                    if value < 0 {
                        panic!("negative value for {key}");
                    }
                    Record::new(key, value)
                })
                .build(policy)
                .unwrap();
            cache.put("a", 1).unwrap();
            cache.put("b", 2).unwrap();
            let before = cache.snapshot();

            let err = cache.put("c", -1).unwrap_err();
            assert_eq!(
                err,
                CacheError::CallerPanic {
                    operation: "construct",
                    message: "negative value for c".to_string(),
                },
                "{policy:?}"
            );
            assert_eq!(cache.snapshot(), before, "{policy:?}");
            assert!(!cache.contains("c"));
            cache.check_invariants().unwrap();

            // still usable afterwards
            cache.put("c", 3).unwrap();
            assert_eq!(cache.len(), 2);
        }
    }
}
