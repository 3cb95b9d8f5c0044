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

//! In-place selection of order statistics over a scratch buffer.

/// Returns the `pivot`-th smallest (1-based) of the `non_zeros` nonzero
/// values in `arr`, ignoring zero slots.
///
/// Zeros sort first, so the requested order statistic sits at index
/// `(arr.len() - non_zeros) + pivot - 1` of the fully ordered array.
/// The buffer is partially reordered in place.
pub(crate) fn select_excluding_zeros(arr: &mut [u64], non_zeros: usize, pivot: usize) -> u64 {
    debug_assert!(pivot >= 1 && pivot <= non_zeros);
    let target = arr.len() - non_zeros + pivot - 1;
    select(arr, 0, arr.len() - 1, target)
}

/// Classic iterative quick-select on `arr[lo..=hi]` for the value that
/// would land at `target` if the slice were sorted.
fn select(arr: &mut [u64], mut lo: usize, mut hi: usize, target: usize) -> u64 {
    while hi > lo {
        let j = partition(arr, lo, hi);
        if j == target {
            return arr[target];
        }
        if j > target {
            hi = j - 1;
        } else {
            lo = j + 1;
        }
    }
    arr[target]
}

// Hoare partition around arr[lo]; returns the final index of the pivot.
fn partition(arr: &mut [u64], lo: usize, hi: usize) -> usize {
    let mut i = lo;
    let mut j = hi + 1;
    let v = arr[lo];
    loop {
        loop {
            i += 1;
            if arr[i] >= v || i == hi {
                break;
            }
        }
        loop {
            j -= 1;
            if v >= arr[j] || j == lo {
                break;
            }
        }
        if i >= j {
            break;
        }
        arr.swap(i, j);
    }
    arr.swap(lo, j);
    j
}
