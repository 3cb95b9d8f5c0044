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

use theta_sketch::theta::a_not_b;
use theta_sketch::theta::Intersection;
use theta_sketch::theta::Union;
use theta_sketch::theta::UpdateSketch;

fn sketch_of_range(lg_k: u8, range: std::ops::Range<u64>) -> UpdateSketch {
    let mut sketch = UpdateSketch::builder().lg_k(lg_k).build();
    for i in range {
        sketch.update_u64(i);
    }
    sketch
}

#[test]
fn union_of_overlapping_streams() {
    // 1..5000 and 4001..9000 overlap in 4001..5000; the true union is 9000.
    let a = sketch_of_range(12, 1..5001);
    let b = sketch_of_range(12, 4001..9001);
    assert!(!a.is_estimation_mode());
    assert!(!b.is_estimation_mode());

    let mut union = Union::builder().lg_k(12).build();
    union.update(&a.compact(false)).unwrap();
    union.update(&b.compact(false)).unwrap();
    let result = union.result(true);
    let est = result.estimate();
    assert!((est - 9000.0).abs() / 9000.0 < 0.10, "estimate {est}");
}

#[test]
fn union_is_commutative_on_cardinality() {
    let a = sketch_of_range(10, 0..50_000);
    let b = sketch_of_range(10, 25_000..75_000);

    let mut ab = Union::builder().lg_k(10).build();
    ab.update(&a.compact(false)).unwrap();
    ab.update(&b.compact(false)).unwrap();

    let mut ba = Union::builder().lg_k(10).build();
    ba.update(&b.compact(false)).unwrap();
    ba.update(&a.compact(false)).unwrap();

    let est_ab = ab.result(true).estimate();
    let est_ba = ba.result(true).estimate();
    assert!((est_ab - 75_000.0).abs() / 75_000.0 < 0.20, "{est_ab}");
    assert!((est_ba - 75_000.0).abs() / 75_000.0 < 0.20, "{est_ba}");
}

#[test]
fn union_with_itself_changes_nothing() {
    let a = sketch_of_range(4, 0..5_000);
    assert!(a.is_estimation_mode());

    let mut once = Union::builder().lg_k(4).build();
    once.update(&a.compact(false)).unwrap();

    let mut twice = Union::builder().lg_k(4).build();
    twice.update(&a.compact(false)).unwrap();
    twice.update(&a.compact(false)).unwrap();

    let single = once.result(true);
    let double = twice.result(true);
    assert_eq!(single.estimate(), double.estimate());
    assert_eq!(single.theta64(), double.theta64());
    assert_eq!(
        single.iter().collect::<Vec<_>>(),
        double.iter().collect::<Vec<_>>()
    );
}

#[test]
fn union_absorbs_update_sketches_directly() {
    let a = sketch_of_range(12, 0..1_000);
    let b = sketch_of_range(12, 500..1_500);

    let mut union = Union::builder().lg_k(12).build();
    union.update_sketch(&a).unwrap();
    union.update_sketch(&b).unwrap();
    assert_eq!(union.result(true).estimate(), 1_500.0);
}

#[test]
fn union_of_empties_is_empty() {
    let a = UpdateSketch::builder().build();
    let b = UpdateSketch::builder().build();
    let mut union = Union::builder().build();
    union.update(&a.compact(false)).unwrap();
    union.update(&b.compact(false)).unwrap();
    let result = union.result(true);
    assert!(result.is_empty());
    assert_eq!(result.estimate(), 0.0);
    assert_eq!(result.num_retained(), 0);
}

#[test]
fn union_rejects_mismatched_seeds() {
    let a = UpdateSketch::builder().seed(1).build();
    let mut b = UpdateSketch::builder().seed(2).build();
    b.update_u64(1);

    let mut union = Union::builder().seed(1).build();
    union.update(&a.compact(false)).unwrap(); // empty input short-circuits
    let err = union.update(&b.compact(false)).unwrap_err();
    assert!(err.message().contains("incompatible seed hash"));
}

#[test]
fn union_reset_allows_reuse() {
    let a = sketch_of_range(12, 0..2_000);
    let mut union = Union::builder().lg_k(12).build();
    union.update(&a.compact(false)).unwrap();
    assert_eq!(union.result(false).estimate(), 2_000.0);

    union.reset();
    let empty = union.result(false);
    assert!(empty.is_empty());

    let b = sketch_of_range(12, 0..300);
    union.update(&b.compact(false)).unwrap();
    assert_eq!(union.result(false).estimate(), 300.0);
}

#[test]
fn intersection_of_exact_sketches_is_exact() {
    // 0..6000 and 4000..10000 intersect in 4000..6000.
    let a = sketch_of_range(13, 0..6_000);
    let b = sketch_of_range(13, 4_000..10_000);
    assert!(!a.is_estimation_mode());
    assert!(!b.is_estimation_mode());

    let mut intersection = Intersection::new();
    intersection.intersect(&a.compact(false)).unwrap();
    intersection.intersect(&b.compact(false)).unwrap();
    let result = intersection.result(true);
    assert_eq!(result.estimate(), 2_000.0);
}

#[test]
fn intersection_of_estimating_sketches_is_close() {
    let a = sketch_of_range(12, 0..60_000);
    let b = sketch_of_range(12, 40_000..100_000);
    assert!(a.is_estimation_mode());
    assert!(b.is_estimation_mode());

    let mut intersection = Intersection::new();
    intersection.intersect(&a.compact(false)).unwrap();
    intersection.intersect(&b.compact(false)).unwrap();
    let est = intersection.result(false).estimate();
    assert!((est - 20_000.0).abs() / 20_000.0 < 0.30, "estimate {est}");
}

#[test]
fn intersection_with_disjoint_input_is_zero() {
    let a = sketch_of_range(12, 0..1_000);
    let b = sketch_of_range(12, 5_000..6_000);

    let mut intersection = Intersection::new();
    intersection.intersect(&a.compact(false)).unwrap();
    intersection.intersect(&b.compact(false)).unwrap();
    let result = intersection.result(false);
    assert_eq!(result.num_retained(), 0);
    assert_eq!(result.estimate(), 0.0);
    // Nothing was ever empty, so the result is a degenerate zero, not an
    // empty sketch.
    assert!(!result.is_empty());
}

#[test]
fn intersection_with_an_empty_input_is_empty() {
    let a = sketch_of_range(12, 0..1_000);
    let empty = UpdateSketch::builder().build();

    let mut intersection = Intersection::new();
    intersection.intersect(&a.compact(false)).unwrap();
    intersection.intersect(&empty.compact(false)).unwrap();
    let result = intersection.result(false);
    assert!(result.is_empty());
    assert_eq!(result.estimate(), 0.0);
}

#[test]
#[should_panic(expected = "intersect must be called before result")]
fn intersection_without_inputs_panics() {
    let intersection = Intersection::new();
    intersection.result(false);
}

#[test]
fn intersection_rejects_mismatched_seeds() {
    let mut a = UpdateSketch::builder().seed(7).build();
    a.update_u64(1);
    let mut intersection = Intersection::new();
    let err = intersection.intersect(&a.compact(false)).unwrap_err();
    assert!(err.message().contains("incompatible seed hash"));
}

#[test]
fn a_not_b_of_exact_sketches_is_exact() {
    // 1..5000 minus 4001..9000 leaves 1..4000.
    let a = sketch_of_range(13, 1..5_001);
    let b = sketch_of_range(13, 4_001..9_001);

    let diff = a_not_b(&a.compact(false), &b.compact(false), true).unwrap();
    assert_eq!(diff.estimate(), 4_000.0);
    assert!(!diff.is_estimation_mode());
}

#[test]
fn a_not_b_with_estimating_inputs_is_close() {
    let a = sketch_of_range(12, 0..60_000);
    let b = sketch_of_range(12, 40_000..100_000);

    let diff = a_not_b(&a.compact(false), &b.compact(false), false).unwrap();
    let est = diff.estimate();
    assert!((est - 40_000.0).abs() / 40_000.0 < 0.30, "estimate {est}");
}

#[test]
fn a_not_b_edges() {
    let a = sketch_of_range(12, 0..100);
    let empty = UpdateSketch::builder().build();

    // A minus nothing is A.
    let diff = a_not_b(&a.compact(false), &empty.compact(false), true).unwrap();
    assert_eq!(diff.estimate(), 100.0);

    // Nothing minus B is empty.
    let diff = a_not_b(&empty.compact(false), &a.compact(false), true).unwrap();
    assert!(diff.is_empty());
    assert_eq!(diff.estimate(), 0.0);

    // A minus itself is a degenerate zero.
    let diff = a_not_b(&a.compact(false), &a.compact(false), true).unwrap();
    assert_eq!(diff.num_retained(), 0);
    assert_eq!(diff.estimate(), 0.0);
}

#[test]
fn a_not_b_rejects_mismatched_seeds() {
    let mut a = UpdateSketch::builder().seed(1).build();
    let mut b = UpdateSketch::builder().seed(2).build();
    a.update_u64(1);
    b.update_u64(2);
    let err = a_not_b(&a.compact(false), &b.compact(false), true).unwrap_err();
    assert!(err.message().contains("incompatible seed hash"));
}
