// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use theta_sketch::codec::family::Family;
use theta_sketch::error::ErrorKind;
use theta_sketch::theta::CompactThetaSketch;
use theta_sketch::theta::UpdateSketch;

fn assert_update_sketches_equal(a: &UpdateSketch, b: &UpdateSketch) {
    assert_eq!(a.is_empty(), b.is_empty());
    assert_eq!(a.is_estimation_mode(), b.is_estimation_mode());
    assert_eq!(a.theta64(), b.theta64());
    assert_eq!(a.num_retained(), b.num_retained());
    assert_eq!(a.estimate(), b.estimate());
    assert_eq!(a.lg_k(), b.lg_k());
    assert_eq!(a.seed_hash(), b.seed_hash());
    assert_eq!(a.family(), b.family());
    let mut entries_a: Vec<u64> = a.iter().collect();
    let mut entries_b: Vec<u64> = b.iter().collect();
    entries_a.sort_unstable();
    entries_b.sort_unstable();
    assert_eq!(entries_a, entries_b);
}

#[test]
fn quick_select_update_form_round_trips() {
    let mut sketch = UpdateSketch::builder().lg_k(4).build();
    for i in 0..1_000u64 {
        sketch.update_u64(i);
    }
    let bytes = sketch.serialize();
    let decoded = UpdateSketch::deserialize(&bytes).unwrap();
    assert_update_sketches_equal(&sketch, &decoded);
    assert_eq!(decoded.serialize(), bytes);
}

#[test]
fn empty_update_form_round_trips() {
    let sketch = UpdateSketch::builder().lg_k(9).build();
    let bytes = sketch.serialize();
    let decoded = UpdateSketch::deserialize(&bytes).unwrap();
    assert!(decoded.is_empty());
    assert_eq!(decoded.estimate(), 0.0);
    assert_eq!(decoded.serialize(), bytes);
}

#[test]
fn alpha_update_form_round_trips_without_stale_slots() {
    let mut sketch = UpdateSketch::builder()
        .family(Family::ALPHA)
        .lg_k(9)
        .build();
    for i in 0..10_000u64 {
        sketch.update_u64(i);
    }
    let bytes = sketch.serialize();
    let decoded = UpdateSketch::deserialize(&bytes).unwrap();
    assert_eq!(decoded.family(), Family::ALPHA);
    assert_eq!(decoded.theta64(), sketch.theta64());
    assert_eq!(decoded.num_retained(), sketch.num_retained());
    assert_eq!(decoded.estimate(), sketch.estimate());
    // The blob was cleaned on the way out, so it re-serializes untouched.
    assert_eq!(decoded.serialize(), bytes);
}

#[test]
fn deserialized_sketch_keeps_accepting_updates() {
    let mut sketch = UpdateSketch::builder().lg_k(4).build();
    for i in 0..100u64 {
        sketch.update_u64(i);
    }
    let mut decoded = UpdateSketch::deserialize(&sketch.serialize()).unwrap();
    for i in 100..200u64 {
        sketch.update_u64(i);
        decoded.update_u64(i);
    }
    assert_update_sketches_equal(&sketch, &decoded);
}

#[test]
fn update_form_round_trips_with_sampling_and_custom_seed() {
    let mut sketch = UpdateSketch::builder()
        .lg_k(9)
        .seed(1234)
        .sampling_probability(0.5)
        .build();
    for i in 0..300u64 {
        sketch.update_u64(i);
    }
    let bytes = sketch.serialize();
    // The right seed is required.
    let err = UpdateSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    let decoded = UpdateSketch::deserialize_with_seed(&bytes, 1234).unwrap();
    assert_update_sketches_equal(&sketch, &decoded);
}

#[test]
fn compact_form_round_trips_byte_for_byte() {
    let mut sketch = UpdateSketch::builder().lg_k(5).build();
    for i in 0..5_000u64 {
        sketch.update_u64(i);
    }
    let compact = sketch.compact(true);
    assert!(compact.is_estimation_mode());

    let bytes = compact.serialize();
    let decoded = CompactThetaSketch::deserialize(&bytes).unwrap();
    assert_eq!(decoded.estimate(), compact.estimate());
    assert_eq!(decoded.theta64(), compact.theta64());
    assert_eq!(decoded.num_retained(), compact.num_retained());
    assert!(decoded.is_ordered());
    assert_eq!(decoded.serialize(), bytes);
}

#[test]
fn compact_empty_and_single_item_round_trip() {
    let empty = UpdateSketch::builder().build().compact(true);
    let bytes = empty.serialize();
    assert_eq!(bytes.len(), 8);
    let decoded = CompactThetaSketch::deserialize(&bytes).unwrap();
    assert!(decoded.is_empty());
    assert_eq!(decoded.serialize(), bytes);

    let mut one = UpdateSketch::builder().build();
    one.update_str("only");
    let single = one.compact(true);
    let bytes = single.serialize();
    assert_eq!(bytes.len(), 24);
    let decoded = CompactThetaSketch::deserialize(&bytes).unwrap();
    assert_eq!(decoded.num_retained(), 1);
    assert_eq!(decoded.estimate(), 1.0);
    assert_eq!(decoded.serialize(), bytes);
}

#[test]
fn unordered_compact_round_trips() {
    let mut sketch = UpdateSketch::builder().lg_k(4).build();
    for i in 0..2_000u64 {
        sketch.update_u64(i);
    }
    let compact = sketch.compact(false);
    let bytes = compact.serialize();
    let decoded = CompactThetaSketch::deserialize(&bytes).unwrap();
    assert_eq!(decoded.is_ordered(), compact.is_ordered());
    assert_eq!(
        decoded.iter().collect::<Vec<_>>(),
        compact.iter().collect::<Vec<_>>()
    );
}

#[test]
fn deserialize_rejects_wrong_family() {
    let mut sketch = UpdateSketch::builder().build();
    sketch.update_u64(1);

    // A compact blob is not an update sketch.
    let compact_bytes = sketch.compact(true).serialize();
    let err = UpdateSketch::deserialize(&compact_bytes).unwrap_err();
    assert!(err.message().contains("not an update sketch family"));

    // An update blob is not a compact sketch.
    let update_bytes = sketch.serialize();
    let err = CompactThetaSketch::deserialize(&update_bytes).unwrap_err();
    assert!(err.message().contains("invalid family"));
}

#[test]
fn deserialize_rejects_unsupported_serial_version() {
    let mut sketch = UpdateSketch::builder().build();
    sketch.update_u64(1);
    let mut bytes = sketch.serialize();
    bytes[1] = 99;
    let err = UpdateSketch::deserialize(&bytes).unwrap_err();
    assert!(err.message().contains("unsupported serial version"));
}

#[test]
fn deserialize_rejects_truncated_blob() {
    let mut sketch = UpdateSketch::builder().lg_k(4).build();
    for i in 0..100u64 {
        sketch.update_u64(i);
    }
    let bytes = sketch.serialize();
    for len in [0, 1, 7, 23, bytes.len() - 1] {
        let err = UpdateSketch::deserialize(&bytes[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData, "len {len}");
    }

    let compact_bytes = sketch.compact(true).serialize();
    let err = CompactThetaSketch::deserialize(&compact_bytes[..compact_bytes.len() - 1]).unwrap_err();
    assert!(err.message().contains("insufficient data"));
}

#[test]
fn deserialize_rejects_seed_mismatch() {
    let mut sketch = UpdateSketch::builder().seed(7).build();
    sketch.update_str("apple");

    let update_bytes = sketch.serialize();
    let err = UpdateSketch::deserialize_with_seed(&update_bytes, 8).unwrap_err();
    assert!(err.message().contains("incompatible seed hash"));

    let compact_bytes = sketch.compact(true).serialize();
    let err = CompactThetaSketch::deserialize_with_seed(&compact_bytes, 8).unwrap_err();
    assert!(err.message().contains("incompatible seed hash"));
}

#[test]
fn deserialize_rejects_theta_decrement_before_target_size() {
    let mut sketch = UpdateSketch::builder().lg_k(9).build();
    sketch.update_u64(1);
    let mut bytes = sketch.serialize();
    // Forge a decremented theta while lg_arr is still below lg_nom + 1.
    assert!(bytes[4] <= bytes[3]);
    bytes[16..24].copy_from_slice(&(u64::MAX / 4).to_le_bytes());
    let err = UpdateSketch::deserialize(&bytes).unwrap_err();
    assert!(err.message().contains("theta decremented"));
}

#[test]
fn compact_deserialize_rejects_flag_inconsistency() {
    let sketch = UpdateSketch::builder().build().compact(true);
    let mut bytes = sketch.serialize();
    // Clear the compact flag.
    bytes[5] &= !(1 << 3);
    let err = CompactThetaSketch::deserialize(&bytes).unwrap_err();
    assert!(err.message().contains("compact flag"));
}
