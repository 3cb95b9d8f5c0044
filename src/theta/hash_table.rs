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

//! Open-addressed hash-table operations over a `u64` slot array.
//!
//! Slot value zero is the empty sentinel; a table never holds two copies
//! of the same nonzero hash. Probing is double hashing: the start index
//! comes from the low bits of the hash and the stride from bits above the
//! index, forced odd so that a power-of-two table is fully traversed.

/// Largest valid theta; also the theta of a sketch in exact mode.
pub const MAX_THETA: u64 = i64::MAX as u64;

/// `MAX_THETA` rounded into the double domain (2^63).
pub(crate) const MAX_THETA_AS_F64: f64 = MAX_THETA as f64;

/// Smallest permitted log2 table length (32 slots).
pub(crate) const MIN_LG_ARR_LONGS: u8 = 5;

/// Default log2 nominal entries for builders.
pub(crate) const DEFAULT_LG_K: u8 = 12;

/// Smallest log2 nominal entries for the QuickSelect variant.
pub(crate) const QS_MIN_LG_K: u8 = 4;

/// Smallest log2 nominal entries for the Alpha variant.
pub(crate) const ALPHA_MIN_LG_K: u8 = 9;

/// Largest log2 nominal entries for either variant.
pub(crate) const MAX_LG_K: u8 = 26;

const STRIDE_MASK: u64 = 0x3F;

#[inline]
pub(crate) fn stride(hash: u64, lg_arr: u8) -> usize {
    (((hash >> lg_arr) & STRIDE_MASK) as usize) * 2 + 1
}

/// Returns true if `hash` is present in the table.
pub(crate) fn hash_search(table: &[u64], lg_arr: u8, hash: u64) -> bool {
    debug_assert!(hash != 0);
    let mask = (1usize << lg_arr) - 1;
    let stride = stride(hash, lg_arr);
    let mut probe = (hash as usize) & mask;
    loop {
        let slot = table[probe];
        if slot == 0 {
            return false;
        }
        if slot == hash {
            return true;
        }
        probe = (probe + stride) & mask;
    }
}

/// Inserts `hash` unless it is already present.
///
/// Returns true if the value was newly written, false if the exact value
/// was found during the probe.
///
/// # Panics
///
/// Panics if the probe walks the entire table without finding an empty
/// slot. The update sketches resize well before the table can fill, so
/// this indicates a corrupted table.
pub(crate) fn hash_insert(table: &mut [u64], lg_arr: u8, hash: u64) -> bool {
    debug_assert!(hash != 0);
    let arr = 1usize << lg_arr;
    let mask = arr - 1;
    let stride = stride(hash, lg_arr);
    let mut probe = (hash as usize) & mask;
    for _ in 0..arr {
        let slot = table[probe];
        if slot == 0 {
            table[probe] = hash;
            return true;
        }
        if slot == hash {
            return false;
        }
        probe = (probe + stride) & mask;
    }
    panic!("hash table has no empty slot; the table is corrupted");
}

/// Counts the slots strictly inside `(0, theta)`.
pub(crate) fn count_below(table: &[u64], theta: u64) -> usize {
    table.iter().filter(|&&v| v != 0 && v < theta).count()
}

/// Rehashes every `src` value inside `(0, theta)` into `dst`.
///
/// Returns the number of values written. This is the single bulk move
/// used by resize, rebuild, and merge paths.
pub(crate) fn hash_array_insert(src: &[u64], dst: &mut [u64], dst_lg_arr: u8, theta: u64) -> usize {
    let mut count = 0;
    for &v in src {
        if v != 0 && v < theta {
            count += usize::from(hash_insert(dst, dst_lg_arr, v));
        }
    }
    count
}

/// Returns the log2 table length that keeps `count` entries below the
/// given load threshold, never below the minimum table size.
pub(crate) fn min_lg_hash_table_size(count: usize, threshold: f64) -> u8 {
    let upper = (count as f64 / threshold).ceil() as usize;
    let arr = upper.next_power_of_two().max(1 << MIN_LG_ARR_LONGS);
    arr.trailing_zeros() as u8
}
