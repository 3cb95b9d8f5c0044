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

//! Set difference of two theta sketches.

use crate::codec::assert::ensure_seed_hashes_match;
use crate::error::Error;
use crate::theta::compact::CompactThetaSketch;
use crate::theta::hash_table;

const MEMBERSHIP_LOAD: f64 = 15.0 / 16.0;

/// Computes `a` minus `b`: the entries of `a` below the common theta that
/// do not appear in `b`.
///
/// This is a one-shot computation over two snapshots. Fails if the inputs
/// were built with different seeds.
///
/// # Examples
///
/// ```
/// use theta_sketch::theta::{a_not_b, UpdateSketch};
///
/// let mut a = UpdateSketch::builder().build();
/// let mut b = UpdateSketch::builder().build();
/// for i in 0..100u64 {
///     a.update_u64(i);
/// }
/// for i in 60..100u64 {
///     b.update_u64(i);
/// }
///
/// let diff = a_not_b(&a.compact(false), &b.compact(false), true).unwrap();
/// assert_eq!(diff.estimate(), 60.0);
/// ```
pub fn a_not_b(
    a: &CompactThetaSketch,
    b: &CompactThetaSketch,
    ordered: bool,
) -> Result<CompactThetaSketch, Error> {
    ensure_seed_hashes_match(a.seed_hash(), b.seed_hash())?;
    let theta = a.theta64().min(b.theta64());

    let entries: Vec<u64> = if b.num_retained() == 0 {
        a.iter().filter(|&h| h < theta).collect()
    } else {
        let lg_arr = hash_table::min_lg_hash_table_size(b.num_retained(), MEMBERSHIP_LOAD);
        let mut table = vec![0u64; 1usize << lg_arr];
        for hash in b.iter() {
            hash_table::hash_insert(&mut table, lg_arr, hash);
        }
        a.iter()
            .filter(|&h| h < theta && !hash_table::hash_search(&table, lg_arr, h))
            .collect()
    };

    Ok(CompactThetaSketch::from_sketch_state(
        entries,
        theta,
        a.seed_hash(),
        ordered,
        a.is_empty(),
    ))
}
