//! End-to-end tests for the composed range filter
//!
//! Covers the full query surface over key sets large enough to populate
//! both tiers: point lookups, range lookups against ground truth,
//! iterator walks, approximate counts, and serialization round trips.

use rand::prelude::*;
use rand::rngs::StdRng;

use rsurf::{SuffixConfig, Surf, SurfConfig};

/// Deterministic pseudo-word list, sorted and unique
fn word_keys(count: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys: Vec<Vec<u8>> = (0..count * 2)
        .map(|_| {
            let len = rng.gen_range(3..=10);
            (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect()
        })
        .collect();
    keys.sort();
    keys.dedup();
    keys.truncate(count);
    keys
}

fn random_probe(rng: &mut StdRng) -> Vec<u8> {
    let len = rng.gen_range(3..=10);
    (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect()
}

mod point_lookup {
    use super::*;

    #[test]
    fn test_empty_set() {
        let filter = Surf::new::<&[u8]>(&[]).unwrap();
        assert!(!filter.lookup(b"anything"));
        assert!(!filter.lookup_range(b"a", true, b"z", true));
        assert_eq!(filter.approx_count(b"a", b"z"), 0);
    }

    #[test]
    fn test_single_key() {
        let filter = Surf::new(&[b"apple".as_ref()]).unwrap();
        assert!(filter.lookup(b"apple"));
        // no branching child along "b", so this must miss
        assert!(!filter.lookup(b"banana"));
    }

    #[test]
    fn test_no_false_negatives_across_configs() {
        let keys = word_keys(2000, 7);
        for config in [
            SurfConfig::default(),
            SurfConfig::default().with_dense(false),
            SurfConfig::default().with_sparse_dense_ratio(1),
            SurfConfig::default().with_suffix(SuffixConfig::hash(8)),
            SurfConfig::default().with_suffix(SuffixConfig::real(8)),
            SurfConfig::default().with_suffix(SuffixConfig::mixed(4, 4)),
        ] {
            let filter = Surf::with_config(&keys, config).unwrap();
            for key in &keys {
                assert!(filter.lookup(key), "config {:?} key {:?}", config, key);
            }
        }
    }

    #[test]
    fn test_hash_suffix_cuts_false_positives() {
        let keys = word_keys(2000, 11);
        let plain = Surf::new(&keys).unwrap();
        let hashed =
            Surf::with_config(&keys, SurfConfig::default().with_suffix(SuffixConfig::hash(8)))
                .unwrap();

        let mut rng = StdRng::seed_from_u64(12);
        let mut plain_fp = 0u32;
        let mut hashed_fp = 0u32;
        let mut negatives = 0u32;
        for _ in 0..5000 {
            let probe = random_probe(&mut rng);
            if keys.binary_search(&probe).is_ok() {
                continue;
            }
            negatives += 1;
            if plain.lookup(&probe) {
                plain_fp += 1;
            }
            if hashed.lookup(&probe) {
                hashed_fp += 1;
            }
        }
        assert!(negatives > 4000);
        assert!(hashed_fp <= plain_fp);
        // 8 suffix bits should push the rate well below 3%
        assert!(
            (hashed_fp as f64) / (negatives as f64) < 0.03,
            "false positive rate too high: {}/{}",
            hashed_fp,
            negatives
        );
    }
}

mod ordered_integers {
    use super::*;

    fn u64_keys(range: std::ops::Range<u64>) -> Vec<[u8; 8]> {
        range.map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn test_dense_integer_keys() {
        let keys = u64_keys(0..1000);
        let filter =
            Surf::with_config(&keys, SurfConfig::default().with_suffix(SuffixConfig::real(8)))
                .unwrap();
        for v in 0..1000u64 {
            assert!(filter.lookup(&v.to_be_bytes()), "value {}", v);
        }
        // probes beyond the stored range miss on a label, deterministically
        for v in [1000u64, 1234, 5000, u64::MAX] {
            assert!(!filter.lookup(&v.to_be_bytes()), "value {}", v);
        }
    }

    #[test]
    fn test_sparse_integer_keys_with_gaps() {
        let keys: Vec<[u8; 8]> = (0..500u64).map(|v| (v * 97).to_be_bytes()).collect();
        let filter =
            Surf::with_config(&keys, SurfConfig::default().with_suffix(SuffixConfig::real(8)))
                .unwrap();
        for v in (0..500u64).map(|v| v * 97) {
            assert!(filter.lookup(&v.to_be_bytes()));
        }
        let mut missed = 0;
        for v in (0..500u64).map(|v| v * 97 + 13) {
            if !filter.lookup(&v.to_be_bytes()) {
                missed += 1;
            }
        }
        // the real suffix disambiguates almost every absent probe
        assert!(missed > 450, "only {} of 500 absent probes rejected", missed);
    }

    #[test]
    fn test_integer_range_queries() {
        let keys: Vec<[u8; 8]> = (0..200u64).map(|v| (v * 10).to_be_bytes()).collect();
        let filter =
            Surf::with_config(&keys, SurfConfig::default().with_suffix(SuffixConfig::real(8)))
                .unwrap();
        // [15, 19] contains nothing; [15, 20] contains 20
        assert!(!filter.lookup_range(&15u64.to_be_bytes(), true, &19u64.to_be_bytes(), true));
        assert!(filter.lookup_range(&15u64.to_be_bytes(), true, &20u64.to_be_bytes(), true));
        assert!(filter.lookup_range(&0u64.to_be_bytes(), true, &0u64.to_be_bytes(), true));
        assert!(!filter.lookup_range(&1991u64.to_be_bytes(), true, &1999u64.to_be_bytes(), true));
    }
}

mod range_lookup {
    use super::*;

    #[test]
    fn test_ranges_against_ground_truth() {
        let keys = word_keys(5000, 21);
        let filter =
            Surf::with_config(&keys, SurfConfig::default().with_suffix(SuffixConfig::real(8)))
                .unwrap();

        let mut rng = StdRng::seed_from_u64(22);
        let mut false_positives = 0u32;
        let mut total_empty = 0u32;
        for _ in 0..1000 {
            let mut left = random_probe(&mut rng);
            let mut right = random_probe(&mut rng);
            if left > right {
                std::mem::swap(&mut left, &mut right);
            }
            let start = keys.partition_point(|k| k.as_slice() < left.as_slice());
            let truth = start < keys.len() && keys[start].as_slice() <= right.as_slice();
            let answer = filter.lookup_range(&left, true, &right, true);
            if truth {
                // a key in range must always be found
                assert!(answer, "false negative for [{:?}, {:?}]", left, right);
            } else {
                total_empty += 1;
                if answer {
                    false_positives += 1;
                }
            }
        }
        if total_empty > 100 {
            assert!(
                (false_positives as f64) / (total_empty as f64) < 0.5,
                "range false positive rate too high: {}/{}",
                false_positives,
                total_empty
            );
        }
    }

    #[test]
    fn test_approx_count_bound_on_stored_keys() {
        let keys = word_keys(3000, 31);
        for config in [
            SurfConfig::default().with_suffix(SuffixConfig::real(8)),
            SurfConfig::default()
                .with_sparse_dense_ratio(1)
                .with_suffix(SuffixConfig::real(8)),
            SurfConfig::default()
                .with_dense(false)
                .with_suffix(SuffixConfig::real(8)),
        ] {
            let filter = Surf::with_config(&keys, config).unwrap();
            let mut rng = StdRng::seed_from_u64(32);
            for _ in 0..300 {
                let i = rng.gen_range(0..keys.len());
                let j = rng.gen_range(0..keys.len());
                let (i, j) = (i.min(j), i.max(j));
                if i == j {
                    continue;
                }
                let truth = (j - i - 1) as u64;
                let approx = filter.approx_count(&keys[i], &keys[j]);
                assert!(
                    approx <= truth && approx + 2 >= truth,
                    "config {:?}: count between {:?} and {:?}: approx {} truth {}",
                    config,
                    keys[i],
                    keys[j],
                    approx,
                    truth
                );
            }
        }
    }
}

mod iteration {
    use super::*;

    #[test]
    fn test_seek_and_walk() {
        let keys = word_keys(2000, 41);
        let filter = Surf::new(&keys).unwrap();

        // a full walk visits one stored key per input key, in order
        let mut iter = filter.move_to_first();
        let mut walked: Vec<Vec<u8>> = Vec::new();
        while iter.is_valid() {
            walked.push(iter.key());
            iter.next();
        }
        assert_eq!(walked.len(), keys.len());
        for pair in walked.windows(2) {
            assert!(pair[0] < pair[1], "walk not ascending: {:?}", pair);
        }
        // every stored key is the input key or a strict prefix of it
        for (stored, key) in walked.iter().zip(&keys) {
            assert!(
                key.starts_with(stored),
                "stored {:?} does not prefix {:?}",
                stored,
                key
            );
        }

        // seeking to each key lands on its stored form
        for (i, key) in keys.iter().enumerate() {
            let iter = filter.move_to_key_greater_than(key, true);
            assert!(iter.is_valid(), "seek {:?} invalid", key);
            assert_eq!(iter.key(), walked[i], "seek {:?}", key);
        }
    }

    #[test]
    fn test_backward_walk_mirrors_forward() {
        let keys = word_keys(500, 51);
        let filter = Surf::new(&keys).unwrap();
        let mut forward: Vec<Vec<u8>> = Vec::new();
        let mut iter = filter.move_to_first();
        while iter.is_valid() {
            forward.push(iter.key());
            iter.next();
        }
        let mut backward: Vec<Vec<u8>> = Vec::new();
        let mut iter = filter.move_to_last();
        while iter.is_valid() {
            backward.push(iter.key());
            iter.prev();
        }
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_iterator_next_prev_are_inverse() {
        let keys = word_keys(300, 61);
        let filter = Surf::new(&keys).unwrap();
        let mut iter = filter.move_to_first();
        for _ in 0..100 {
            let here = iter.key();
            assert!(iter.next());
            assert!(iter.prev());
            assert_eq!(iter.key(), here);
            assert!(iter.next());
        }
    }
}

mod serialization {
    use super::*;

    #[test]
    fn test_round_trip_answers_identically() {
        let keys = word_keys(3000, 71);
        for config in [
            SurfConfig::default(),
            SurfConfig::default().with_dense(false),
            SurfConfig::default().with_suffix(SuffixConfig::hash(8)),
            SurfConfig::default().with_suffix(SuffixConfig::mixed(4, 8)),
        ] {
            let filter = Surf::with_config(&keys, config).unwrap();
            let bytes = filter.serialize().unwrap();
            assert_eq!(bytes.len(), filter.serialized_size(), "config {:?}", config);

            let restored = Surf::deserialize(&bytes).unwrap();
            assert_eq!(restored.serialized_size(), bytes.len());

            let mut rng = StdRng::seed_from_u64(72);
            for _ in 0..10_000 {
                let probe = random_probe(&mut rng);
                assert_eq!(
                    filter.lookup(&probe),
                    restored.lookup(&probe),
                    "config {:?} probe {:?}",
                    config,
                    probe
                );
            }

            // the restored filter serializes to the very same bytes
            let bytes2 = restored.serialize().unwrap();
            assert_eq!(bytes, bytes2);
        }
    }

    #[test]
    fn test_truncated_streams_are_rejected() {
        let keys = word_keys(200, 81);
        let filter = Surf::new(&keys).unwrap();
        let bytes = filter.serialize().unwrap();
        for cut in [0, 1, 4, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                Surf::deserialize(&bytes[..cut]).is_err(),
                "cut at {} accepted",
                cut
            );
        }
    }
}
