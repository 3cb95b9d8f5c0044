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

//! Derivations of small deterministic values from the 128-bit hash.
//!
//! These are convenience adaptors over [`hash128`](crate::hash::hash128)
//! for callers that want a uniform integer, a uniform double, or a modulo
//! residue keyed by arbitrary input bytes.

use crate::error::Error;
use crate::hash::hash128;

// Reseed increment for the rejection rounds, from P. L'Ecuyer and R. Simard.
const PRIME: u64 = 9219741426499971445;

// Rejection rounds before giving up. Each round tests four hash words, so
// exhausting the budget requires ~40000 consecutive rejections.
const REJECTION_BUDGET: u32 = 10_000;

const INT_MASK: u64 = 0x7FFF_FFFF;

/// Returns a deterministic uniform integer in `[0, n)` derived from `data`.
///
/// The same input always produces the same integer. Fails with an
/// `InvalidArgument` error if `data` is empty or `n < 2`, and with an
/// internal error in the astronomically unlikely event that no hash word
/// falls below `n` within the iteration budget.
pub fn to_int(data: &[u8], n: i32) -> Result<i32, Error> {
    if data.is_empty() {
        return Err(Error::invalid_argument("input data is empty"));
    }
    if n < 2 {
        return Err(Error::invalid_argument(format!(
            "n must be greater than 1, got {n}"
        )));
    }
    let n = n as u64;
    // Masking to the ceiling power of two keeps the acceptance rate above
    // one half per word while preserving uniformity.
    let mask = if n > (1 << 30) {
        INT_MASK
    } else {
        n.next_power_of_two() - 1
    };
    let mut seed = 0u64;
    for _ in 0..REJECTION_BUDGET {
        let (h1, h2) = hash128(data, seed);
        for word in [h1 & mask, (h1 >> 33) & mask, h2 & mask, (h2 >> 33) & mask] {
            if word < n {
                return Ok(word as i32);
            }
        }
        seed = seed.wrapping_add(PRIME);
    }
    Err(Error::internal(
        "failed to find an integer below n within the iteration budget",
    ))
}

/// Returns a uniform double in `[0, 1)` from a 128-bit hash.
pub fn as_double(hash: (u64, u64)) -> f64 {
    (hash.0 >> 12) as f64 / (1u64 << 52) as f64
}

/// Returns the 128-bit hash value modulo `divisor`.
///
/// Fails with an `InvalidArgument` error if `divisor` is not positive.
pub fn modulo(hash: (u64, u64), divisor: i32) -> Result<i32, Error> {
    if divisor <= 0 {
        return Err(Error::invalid_argument(format!(
            "divisor must be positive, got {divisor}"
        )));
    }
    let (h0, h1) = hash;
    let value = ((h1 as u128) << 64) | (h0 as u128);
    Ok((value % divisor as u128) as i32)
}
