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

//! Compact (immutable) theta sketches.

use crate::codec::assert::ensure_preamble_longs_in_range;
use crate::codec::assert::ensure_seed_hashes_match;
use crate::codec::assert::ensure_serial_version_is;
use crate::codec::assert::insufficient_data;
use crate::codec::family::Family;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::common::binomial_bounds;
use crate::common::NumStdDev;
use crate::error::Error;
use crate::hash::compute_seed_hash;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::theta::hash_table::MAX_THETA;
use crate::theta::hash_table::MAX_THETA_AS_F64;
use crate::theta::serialization as ser;

/// Immutable snapshot of a theta sketch.
///
/// This is the form the set operations consume and produce, and the form
/// intended for storage and transport: a flat array of retained hashes
/// plus theta and the seed hash. It can be ordered (entries sorted
/// ascending) or unordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactThetaSketch {
    entries: Vec<u64>,
    theta: u64,
    seed_hash: u16,
    ordered: bool,
    empty: bool,
}

impl CompactThetaSketch {
    /// Normalizes raw update-sketch state into compact form.
    ///
    /// A never-updated sketch reports theta of one regardless of its
    /// sampling probability. Empty and exact-mode single-entry sketches
    /// are always ordered.
    pub(crate) fn from_sketch_state(
        mut entries: Vec<u64>,
        theta: u64,
        seed_hash: u16,
        ordered: bool,
        empty: bool,
    ) -> Self {
        let theta = if empty { MAX_THETA } else { theta };
        let is_single = entries.len() == 1 && theta == MAX_THETA;
        let ordered = ordered || empty || is_single;
        if ordered && entries.len() > 1 {
            entries.sort_unstable();
        }
        Self {
            entries,
            theta,
            seed_hash,
            ordered,
            empty,
        }
    }

    /// Returns the cardinality estimate.
    pub fn estimate(&self) -> f64 {
        if self.empty {
            return 0.0;
        }
        let num_retained = self.entries.len() as f64;
        if self.theta == MAX_THETA {
            return num_retained;
        }
        num_retained / self.theta()
    }

    /// Returns the approximate lower bound given a number of standard
    /// deviations.
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if !self.is_estimation_mode() {
            return self.entries.len() as f64;
        }
        binomial_bounds::lower_bound(self.entries.len() as u64, self.theta(), num_std_dev)
            .expect("theta is in range")
    }

    /// Returns the approximate upper bound given a number of standard
    /// deviations.
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if !self.is_estimation_mode() {
            return self.entries.len() as f64;
        }
        binomial_bounds::upper_bound(
            self.entries.len() as u64,
            self.theta(),
            num_std_dev,
            self.empty,
        )
        .expect("theta is in range")
    }

    /// Returns theta as a fraction in (0, 1].
    pub fn theta(&self) -> f64 {
        self.theta as f64 / MAX_THETA_AS_F64
    }

    /// Returns theta in the long domain.
    pub fn theta64(&self) -> u64 {
        self.theta
    }

    /// Returns true if the source sketch never saw an update.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Returns true if the estimate is a projection rather than an exact
    /// count.
    pub fn is_estimation_mode(&self) -> bool {
        self.theta < MAX_THETA
    }

    /// Returns the number of retained entries.
    pub fn num_retained(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the entries are sorted ascending.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Returns the 16-bit seed hash.
    pub fn seed_hash(&self) -> u16 {
        self.seed_hash
    }

    /// Returns an iterator over the retained hash values.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().copied()
    }

    fn preamble_longs(&self) -> u8 {
        if self.empty {
            ser::COMPACT_PREAMBLE_LONGS_EMPTY
        } else if self.entries.len() == 1 && self.theta == MAX_THETA {
            ser::COMPACT_PREAMBLE_LONGS_SINGLE
        } else {
            ser::COMPACT_PREAMBLE_LONGS_GENERAL
        }
    }

    /// Serializes this sketch into the compact format.
    pub fn serialize(&self) -> Vec<u8> {
        let pre_longs = self.preamble_longs();
        let mut bytes = SketchBytes::with_capacity(pre_longs as usize * 8 + self.entries.len() * 8);
        bytes.write_u8(pre_longs);
        bytes.write_u8(ser::SERIAL_VERSION);
        bytes.write_u8(Family::COMPACT.id);
        bytes.write_u8(0); // lg_nom, unused in compact form
        bytes.write_u8(0); // lg_arr, unused in compact form

        let mut flags = ser::FLAG_READ_ONLY | ser::FLAG_COMPACT;
        if self.empty {
            flags |= ser::FLAG_EMPTY;
        }
        if self.ordered {
            flags |= ser::FLAG_ORDERED;
        }
        bytes.write_u8(flags);
        bytes.write_u16_le(self.seed_hash);

        if pre_longs > 1 {
            bytes.write_u32_le(self.entries.len() as u32);
            bytes.write_u32_le(0); // pad to the long boundary
        }
        if pre_longs > 2 {
            bytes.write_u64_le(self.theta);
        }
        for &hash in &self.entries {
            bytes.write_u64_le(hash);
        }
        bytes.into_bytes()
    }

    /// Deserializes a compact sketch written with the default seed.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Self::deserialize_with_seed(bytes, DEFAULT_UPDATE_SEED)
    }

    /// Deserializes a compact sketch, validating it against the given
    /// seed.
    pub fn deserialize_with_seed(bytes: &[u8], seed: u64) -> Result<Self, Error> {
        Self::deserialize_inner(bytes, Some(compute_seed_hash(seed)))
    }

    pub(crate) fn deserialize_inner(
        bytes: &[u8],
        expected_seed_hash: Option<u16>,
    ) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);
        let byte0 = cursor
            .read_u8()
            .map_err(insufficient_data("preamble_longs"))?;
        let pre_longs = byte0 & ser::PREAMBLE_LONGS_MASK;
        let ser_ver = cursor
            .read_u8()
            .map_err(insufficient_data("serial_version"))?;
        ensure_serial_version_is(ser::SERIAL_VERSION, ser_ver)?;
        let family_id = cursor.read_u8().map_err(insufficient_data("family_id"))?;
        Family::COMPACT.validate_id(family_id)?;
        ensure_preamble_longs_in_range(
            Family::COMPACT.min_pre_longs..=Family::COMPACT.max_pre_longs,
            pre_longs,
        )?;

        cursor.read_u8().map_err(insufficient_data("lg_nom"))?;
        cursor.read_u8().map_err(insufficient_data("lg_arr"))?;
        let flags = cursor.read_u8().map_err(insufficient_data("flags"))?;
        if flags & ser::FLAG_BIG_ENDIAN != 0 {
            return Err(Error::deserial("big-endian sketches are not supported"));
        }
        if flags & ser::FLAG_COMPACT == 0 {
            return Err(Error::deserial("compact flag missing on a compact blob"));
        }
        let empty = flags & ser::FLAG_EMPTY != 0;
        let ordered = flags & ser::FLAG_ORDERED != 0;
        let seed_hash = cursor
            .read_u16_le()
            .map_err(insufficient_data("seed_hash"))?;
        if let Some(expected) = expected_seed_hash {
            ensure_seed_hashes_match(expected, seed_hash)?;
        }

        if pre_longs == ser::COMPACT_PREAMBLE_LONGS_EMPTY {
            if !empty {
                return Err(Error::deserial(
                    "one preamble long requires the empty flag",
                ));
            }
            return Ok(Self {
                entries: vec![],
                theta: MAX_THETA,
                seed_hash,
                ordered: true,
                empty: true,
            });
        }

        let num_entries = cursor
            .read_u32_le()
            .map_err(insufficient_data("num_entries"))? as usize;
        cursor.read_u32_le().map_err(insufficient_data("pad"))?;
        let theta = if pre_longs > ser::COMPACT_PREAMBLE_LONGS_SINGLE {
            cursor
                .read_u64_le()
                .map_err(insufficient_data("theta_long"))?
        } else {
            MAX_THETA
        };
        if theta == 0 || theta > MAX_THETA {
            return Err(Error::deserial("corrupted: theta out of range"));
        }
        if empty && num_entries != 0 {
            return Err(Error::deserial("corrupted: empty sketch with entries"));
        }

        let mut entries = Vec::with_capacity(num_entries);
        for _ in 0..num_entries {
            let hash = cursor.read_u64_le().map_err(insufficient_data("entries"))?;
            if hash == 0 || hash >= theta {
                return Err(Error::deserial("corrupted: invalid retained hash value"));
            }
            entries.push(hash);
        }

        Ok(Self {
            entries,
            theta,
            seed_hash,
            ordered,
            empty,
        })
    }
}
