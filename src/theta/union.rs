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

//! Union of theta sketches.

use crate::codec::assert::ensure_seed_hashes_match;
use crate::codec::family::Family;
use crate::common::ResizeFactor;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::theta::compact::CompactThetaSketch;
use crate::theta::hash_table::DEFAULT_LG_K;
use crate::theta::sketch::UpdateSketch;

/// Union of any number of theta sketches.
///
/// Internally a QuickSelect sketch (the gadget) absorbs the retained
/// hashes of every input, while the union tracks the running minimum of
/// the input thetas. The result is a compact sketch filtered below that
/// minimum.
///
/// # Examples
///
/// ```
/// use theta_sketch::theta::{Union, UpdateSketch};
///
/// let mut a = UpdateSketch::builder().build();
/// let mut b = UpdateSketch::builder().build();
/// for i in 0..100u64 {
///     a.update_u64(i);
///     b.update_u64(i + 50);
/// }
///
/// let mut union = Union::builder().build();
/// union.update(&a.compact(false)).unwrap();
/// union.update(&b.compact(false)).unwrap();
/// assert_eq!(union.result(true).estimate(), 150.0);
/// ```
#[derive(Debug)]
pub struct Union {
    gadget: UpdateSketch,
    union_theta_long: u64,
}

impl Union {
    /// Creates a builder with default configuration.
    pub fn builder() -> UnionBuilder {
        UnionBuilder::default()
    }

    /// Merges a compact sketch into the union.
    ///
    /// Fails if the input was built with a different seed.
    pub fn update(&mut self, sketch: &CompactThetaSketch) -> Result<(), Error> {
        if sketch.is_empty() {
            return Ok(());
        }
        ensure_seed_hashes_match(self.gadget.seed_hash(), sketch.seed_hash())?;
        self.ingest(sketch.theta64(), sketch.iter());
        Ok(())
    }

    /// Merges an update sketch into the union without compacting it
    /// first.
    pub fn update_sketch(&mut self, sketch: &UpdateSketch) -> Result<(), Error> {
        if sketch.is_empty() {
            return Ok(());
        }
        ensure_seed_hashes_match(self.gadget.seed_hash(), sketch.seed_hash())?;
        self.ingest(sketch.theta64(), sketch.iter());
        Ok(())
    }

    fn ingest(&mut self, theta: u64, hashes: impl Iterator<Item = u64>) {
        self.union_theta_long = self.union_theta_long.min(theta);
        for hash in hashes {
            if hash < self.union_theta_long {
                self.gadget.hash_update(hash);
            }
        }
        // The gadget may have rebuilt below the inputs' minimum.
        self.union_theta_long = self.union_theta_long.min(self.gadget.theta64());
    }

    /// Returns the union as a compact sketch.
    ///
    /// If `ordered` is true the retained hashes are sorted ascending.
    pub fn result(&self, ordered: bool) -> CompactThetaSketch {
        let theta = self.union_theta_long.min(self.gadget.theta64());
        let entries: Vec<u64> = self.gadget.iter().filter(|&h| h < theta).collect();
        CompactThetaSketch::from_sketch_state(
            entries,
            theta,
            self.gadget.seed_hash(),
            ordered,
            self.gadget.is_empty(),
        )
    }

    /// Clears the union for reuse.
    pub fn reset(&mut self) {
        self.gadget.reset();
        self.union_theta_long = self.gadget.theta64();
    }
}

/// Builder for [`Union`].
#[derive(Debug)]
pub struct UnionBuilder {
    lg_k: u8,
    seed: u64,
    p: f32,
    rf: ResizeFactor,
}

impl Default for UnionBuilder {
    fn default() -> Self {
        Self {
            lg_k: DEFAULT_LG_K,
            seed: DEFAULT_UPDATE_SEED,
            p: 1.0,
            rf: ResizeFactor::X8,
        }
    }
}

impl UnionBuilder {
    /// Sets log2 of the nominal entry count of the result.
    ///
    /// When combining sketches of different sizes, use the largest input
    /// lg_k to avoid losing accuracy. The range is checked when the
    /// gadget is built.
    pub fn lg_k(mut self, lg_k: u8) -> Self {
        self.lg_k = lg_k;
        self
    }

    /// Sets the update hash seed; must match the inputs' seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the sampling probability of the gadget.
    pub fn sampling_probability(mut self, p: f32) -> Self {
        self.p = p;
        self
    }

    /// Sets the gadget's table resize factor.
    pub fn resize_factor(mut self, rf: ResizeFactor) -> Self {
        self.rf = rf;
        self
    }

    /// Builds the union.
    pub fn build(self) -> Union {
        let gadget = UpdateSketch::builder()
            .family(Family::QUICKSELECT)
            .lg_k(self.lg_k)
            .seed(self.seed)
            .sampling_probability(self.p)
            .resize_factor(self.rf)
            .build();
        let union_theta_long = gadget.theta64();
        Union {
            gadget,
            union_theta_long,
        }
    }
}
