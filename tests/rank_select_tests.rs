//! Property tests for the rank/select primitives
//!
//! The trie tiers lean on exact rank/select arithmetic; these properties
//! pin the contracts down against a naive reference over arbitrary bit
//! patterns.

use proptest::collection::vec;
use proptest::prelude::*;

use rsurf::io::{DataOutput, SliceDataInput, VecDataOutput};
use rsurf::{BitVector, RankVector, SelectVector};

const MSB: u64 = 1u64 << 63;

fn bit_vector(bits: &[bool]) -> BitVector {
    let mut words = vec![0u64; (bits.len() + 63) / 64];
    for (i, &b) in bits.iter().enumerate() {
        if b {
            words[i / 64] |= MSB >> (i % 64);
        }
    }
    BitVector::from_level_words(&[words], &[bits.len()], 0, 1)
}

proptest! {
    #[test]
    fn prop_rank_matches_naive(bits in vec(any::<bool>(), 1..2048)) {
        let rv = RankVector::with_default_block(bit_vector(&bits));
        let mut running = 0usize;
        for (pos, &b) in bits.iter().enumerate() {
            if b {
                running += 1;
            }
            prop_assert_eq!(rv.rank(pos), running);
        }
        prop_assert_eq!(rv.rank(bits.len() + 100), rv.num_ones());
    }

    #[test]
    fn prop_select_matches_naive(bits in vec(any::<bool>(), 1..2048)) {
        let sv = SelectVector::with_default_interval(bit_vector(&bits));
        let mut k = 0usize;
        for (pos, &b) in bits.iter().enumerate() {
            if b {
                k += 1;
                prop_assert_eq!(sv.select(k), pos);
            }
        }
        prop_assert_eq!(sv.num_ones(), k);
        // one past the last set bit yields the end sentinel
        prop_assert_eq!(sv.select(k + 1), bits.len());
    }

    #[test]
    fn prop_rank_select_duality(bits in vec(any::<bool>(), 1..2048)) {
        let rv = RankVector::with_default_block(bit_vector(&bits));
        let sv = SelectVector::with_default_interval(bit_vector(&bits));
        for k in 1..=sv.num_ones() {
            prop_assert_eq!(rv.rank(sv.select(k)), k);
        }
        for (pos, &b) in bits.iter().enumerate() {
            if !b {
                // the next set bit at or after an unset position sits
                // strictly beyond it
                prop_assert!(sv.select(rv.rank(pos) + 1) >= pos + 1);
            }
        }
    }

    #[test]
    fn prop_rank_round_trip_is_byte_identical(bits in vec(any::<bool>(), 1..1024)) {
        let rv = RankVector::with_default_block(bit_vector(&bits));
        let mut out = VecDataOutput::new();
        rv.serialize(&mut out).unwrap();
        prop_assert_eq!(out.bytes_written(), rv.serialized_size());
        let bytes = out.into_vec();

        let rv2 = RankVector::deserialize(&mut SliceDataInput::new(&bytes)).unwrap();
        // the deserialized table matches a rebuild from the raw bits
        let rebuilt = RankVector::with_default_block(rv2.bits().clone());
        prop_assert_eq!(rv2.rank_table(), rebuilt.rank_table());

        let mut out2 = VecDataOutput::new();
        rv2.serialize(&mut out2).unwrap();
        prop_assert_eq!(bytes, out2.into_vec());
    }

    #[test]
    fn prop_select_round_trip_is_byte_identical(bits in vec(any::<bool>(), 1..1024)) {
        let sv = SelectVector::with_default_interval(bit_vector(&bits));
        let mut out = VecDataOutput::new();
        sv.serialize(&mut out).unwrap();
        prop_assert_eq!(out.bytes_written(), sv.serialized_size());
        let bytes = out.into_vec();

        let sv2 = SelectVector::deserialize(&mut SliceDataInput::new(&bytes)).unwrap();
        let rebuilt = SelectVector::with_default_interval(sv2.bits().clone());
        prop_assert_eq!(sv2.select_table(), rebuilt.select_table());

        let mut out2 = VecDataOutput::new();
        sv2.serialize(&mut out2).unwrap();
        prop_assert_eq!(bytes, out2.into_vec());
    }

    #[test]
    fn prop_distance_scans_match_naive(bits in vec(any::<bool>(), 2..512)) {
        let bv = bit_vector(&bits);
        for pos in 0..bits.len() {
            let naive_next = bits[pos + 1..]
                .iter()
                .position(|&b| b)
                .map(|d| d + 1)
                .unwrap_or(bits.len() - pos);
            prop_assert_eq!(bv.distance_to_next_set_bit(pos), naive_next);

            let naive_prev = bits[..pos].iter().rposition(|&b| b).map(|p| pos - p);
            prop_assert_eq!(bv.distance_to_prev_set_bit(pos), naive_prev);
        }
    }
}
