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

//! Intersection of theta sketches.

use crate::codec::assert::ensure_seed_hashes_match;
use crate::error::Error;
use crate::hash::compute_seed_hash;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::theta::compact::CompactThetaSketch;
use crate::theta::hash_table;
use crate::theta::hash_table::MAX_THETA;

const MEMBERSHIP_LOAD: f64 = 15.0 / 16.0;

/// Intersection of any number of theta sketches.
///
/// The first input seeds the candidate set; each further input keeps only
/// the candidates it also contains, below the running minimum theta.
///
/// # Examples
///
/// ```
/// use theta_sketch::theta::{Intersection, UpdateSketch};
///
/// let mut a = UpdateSketch::builder().build();
/// let mut b = UpdateSketch::builder().build();
/// for i in 0..100u64 {
///     a.update_u64(i);
///     b.update_u64(i + 60);
/// }
///
/// let mut intersection = Intersection::new();
/// intersection.intersect(&a.compact(false)).unwrap();
/// intersection.intersect(&b.compact(false)).unwrap();
/// assert_eq!(intersection.result(true).estimate(), 40.0);
/// ```
#[derive(Debug)]
pub struct Intersection {
    seed_hash: u16,
    theta_long: u64,
    empty: bool,
    candidates: Option<Vec<u64>>,
}

impl Intersection {
    /// Creates an intersection for sketches built with the default seed.
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_UPDATE_SEED)
    }

    /// Creates an intersection for sketches built with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed_hash: compute_seed_hash(seed),
            theta_long: MAX_THETA,
            empty: false,
            candidates: None,
        }
    }

    /// Narrows the intersection by another input sketch.
    ///
    /// Fails if the input was built with a different seed.
    pub fn intersect(&mut self, sketch: &CompactThetaSketch) -> Result<(), Error> {
        ensure_seed_hashes_match(self.seed_hash, sketch.seed_hash())?;
        self.theta_long = self.theta_long.min(sketch.theta64());
        self.empty |= sketch.is_empty();
        let theta = self.theta_long;

        match self.candidates.take() {
            None => {
                self.candidates = Some(sketch.iter().filter(|&h| h < theta).collect());
            }
            Some(candidates) => {
                if candidates.is_empty() || sketch.num_retained() == 0 {
                    self.candidates = Some(vec![]);
                    return Ok(());
                }
                // Membership test against the incoming entries through a
                // scratch hash table sized for them.
                let lg_arr =
                    hash_table::min_lg_hash_table_size(sketch.num_retained(), MEMBERSHIP_LOAD);
                let mut table = vec![0u64; 1usize << lg_arr];
                for hash in sketch.iter() {
                    if hash < theta {
                        hash_table::hash_insert(&mut table, lg_arr, hash);
                    }
                }
                let kept = candidates
                    .into_iter()
                    .filter(|&h| h < theta && hash_table::hash_search(&table, lg_arr, h))
                    .collect();
                self.candidates = Some(kept);
            }
        }
        Ok(())
    }

    /// Returns the intersection as a compact sketch.
    ///
    /// If `ordered` is true the retained hashes are sorted ascending.
    ///
    /// # Panics
    ///
    /// Panics if no sketch was ever presented to [`Self::intersect`]; the
    /// intersection of nothing is unbounded and has no meaningful result.
    pub fn result(&self, ordered: bool) -> CompactThetaSketch {
        let candidates = self
            .candidates
            .as_ref()
            .expect("intersect must be called before result");
        CompactThetaSketch::from_sketch_state(
            candidates.clone(),
            self.theta_long,
            self.seed_hash,
            ordered,
            self.empty,
        )
    }

    /// Returns true if a result is available.
    pub fn has_result(&self) -> bool {
        self.candidates.is_some()
    }
}

impl Default for Intersection {
    fn default() -> Self {
        Self::new()
    }
}
