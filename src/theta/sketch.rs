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

//! Update sketches: the mutable side of the theta family.

use crate::codec::assert::ensure_preamble_longs_is;
use crate::codec::assert::ensure_seed_hashes_match;
use crate::codec::assert::ensure_serial_version_is;
use crate::codec::assert::insufficient_data;
use crate::codec::family::Family;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::common::binomial_bounds;
use crate::common::canonical_double;
use crate::common::quick_select::select_excluding_zeros;
use crate::common::NumStdDev;
use crate::common::ResizeFactor;
use crate::error::Error;
use crate::hash::compute_seed_hash;
use crate::hash::hash128;
use crate::hash::DEFAULT_UPDATE_SEED;
use crate::theta::compact::CompactThetaSketch;
use crate::theta::hash_table;
use crate::theta::hash_table::ALPHA_MIN_LG_K;
use crate::theta::hash_table::DEFAULT_LG_K;
use crate::theta::hash_table::MAX_LG_K;
use crate::theta::hash_table::MAX_THETA;
use crate::theta::hash_table::MAX_THETA_AS_F64;
use crate::theta::hash_table::MIN_LG_ARR_LONGS;
use crate::theta::hash_table::QS_MIN_LG_K;
use crate::theta::serialization as ser;

const QS_RESIZE_THRESHOLD: f64 = 15.0 / 16.0;
const QS_REBUILD_THRESHOLD: f64 = 15.0 / 16.0;
// Tuned for speed while the table is still growing.
const ALPHA_RESIZE_THRESHOLD: f64 = 0.5;
const ALPHA_REBUILD_THRESHOLD: f64 = 15.0 / 16.0;

/// Outcome of a single update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    /// The input was empty or absent and did not touch the sketch.
    Ignored,
    /// The hash was inserted and the retained count grew by one.
    InsertedCountIncremented,
    /// The hash overwrote a stale slot; the retained count is unchanged.
    InsertedCountNotIncremented,
    /// The exact hash was already present.
    RejectedDuplicate,
    /// The hash fell at or above theta and was not retained.
    RejectedOverTheta,
}

impl UpdateResult {
    /// Returns true if the update wrote a new hash into the table.
    pub fn is_inserted(self) -> bool {
        matches!(
            self,
            UpdateResult::InsertedCountIncremented | UpdateResult::InsertedCountNotIncremented
        )
    }
}

#[derive(Debug, Clone)]
enum Variant {
    QuickSelect,
    Alpha {
        alpha: f64,
        split1: u64,
        dirty: bool,
    },
}

/// Mutable theta sketch estimating the number of distinct items fed to
/// it.
///
/// Two variants share this type. The QuickSelect variant (the default) is
/// tuned for space: it lets the table fill, then prunes back to the
/// nominal size in one selection pass. The Alpha variant is tuned for
/// estimator variance: past the nominal size it shrinks theta
/// geometrically on every insertion and cleans stale entries lazily.
///
/// # Examples
///
/// ```
/// use theta_sketch::theta::UpdateSketch;
///
/// let mut sketch = UpdateSketch::builder().lg_k(12).build();
/// for i in 0..1000u64 {
///     sketch.update_u64(i);
/// }
/// assert_eq!(sketch.estimate(), 1000.0);
/// ```
#[derive(Debug, Clone)]
pub struct UpdateSketch {
    lg_nom_longs: u8,
    seed: u64,
    seed_hash: u16,
    p: f32,
    rf: ResizeFactor,
    lg_arr_longs: u8,
    hash_table_threshold: usize,
    cache: Vec<u64>,
    cur_count: usize,
    theta_long: u64,
    empty: bool,
    variant: Variant,
}

fn theta_from_p(p: f32) -> u64 {
    (((p as f64) * MAX_THETA_AS_F64) as u64).min(MAX_THETA)
}

// lg_nom + 1 >= 5 > rf.lg(), so the subtraction cannot underflow.
fn starting_lg_arr(lg_nom: u8, rf: ResizeFactor) -> u8 {
    MIN_LG_ARR_LONGS.max(lg_nom + 1 - rf.lg())
}

impl UpdateSketch {
    /// Creates a builder with default configuration.
    pub fn builder() -> UpdateSketchBuilder {
        UpdateSketchBuilder::default()
    }

    /// Updates the sketch with an unsigned integer.
    pub fn update_u64(&mut self, datum: u64) -> UpdateResult {
        let bytes = datum.to_le_bytes();
        self.hash_and_update(&bytes)
    }

    /// Updates the sketch with a signed integer.
    pub fn update_i64(&mut self, datum: i64) -> UpdateResult {
        let bytes = datum.to_le_bytes();
        self.hash_and_update(&bytes)
    }

    /// Updates the sketch with a double.
    ///
    /// Negative zero and positive zero count as the same item, as do all
    /// NaN bit patterns.
    pub fn update_f64(&mut self, datum: f64) -> UpdateResult {
        let bytes = canonical_double(datum).to_le_bytes();
        self.hash_and_update(&bytes)
    }

    /// Updates the sketch with a float, widening to a double first.
    pub fn update_f32(&mut self, datum: f32) -> UpdateResult {
        self.update_f64(datum as f64)
    }

    /// Updates the sketch with the UTF-8 bytes of a string.
    ///
    /// An empty string is ignored.
    pub fn update_str(&mut self, datum: &str) -> UpdateResult {
        if datum.is_empty() {
            return UpdateResult::Ignored;
        }
        self.hash_and_update(datum.as_bytes())
    }

    /// Updates the sketch with a byte sequence.
    ///
    /// An empty sequence is ignored.
    pub fn update_bytes(&mut self, datum: &[u8]) -> UpdateResult {
        if datum.is_empty() {
            return UpdateResult::Ignored;
        }
        self.hash_and_update(datum)
    }

    fn hash_and_update(&mut self, bytes: &[u8]) -> UpdateResult {
        let (h1, _) = hash128(bytes, self.seed);
        self.hash_update(h1 >> 1)
    }

    /// All updates converge here with a sign-cleared 64-bit hash.
    pub(crate) fn hash_update(&mut self, hash: u64) -> UpdateResult {
        self.empty = false;
        // A zero hash is as unlikely as one equal to MAX_THETA and is
        // screened out the same way.
        if hash == 0 || hash >= self.theta_long {
            return UpdateResult::RejectedOverTheta;
        }
        match self.variant {
            Variant::QuickSelect => self.quick_select_hash_update(hash),
            Variant::Alpha { .. } => self.alpha_hash_update(hash),
        }
    }

    // QuickSelect update path

    fn quick_select_hash_update(&mut self, hash: u64) -> UpdateResult {
        if !hash_table::hash_insert(&mut self.cache, self.lg_arr_longs, hash) {
            return UpdateResult::RejectedDuplicate;
        }
        self.cur_count += 1;
        if self.cur_count > self.hash_table_threshold {
            if self.lg_arr_longs > self.lg_nom_longs {
                self.quick_select_and_rebuild();
            } else {
                self.resize_cache();
            }
        }
        UpdateResult::InsertedCountIncremented
    }

    // Selects the (k+1)-th smallest retained hash as the new theta, then
    // rebuilds the table from the survivors. Leaves exactly k entries.
    fn quick_select_and_rebuild(&mut self) {
        let pivot = (1usize << self.lg_nom_longs) + 1;
        let mut scratch = self.cache.clone();
        self.theta_long = select_excluding_zeros(&mut scratch, self.cur_count, pivot);
        let mut tgt = vec![0u64; self.cache.len()];
        self.cur_count = hash_table::hash_array_insert(
            &self.cache,
            &mut tgt,
            self.lg_arr_longs,
            self.theta_long,
        );
        self.cache = tgt;
    }

    // Grows the table toward the target size by the resize factor.
    fn resize_cache(&mut self) {
        let lg_tgt = self.lg_nom_longs + 1;
        if lg_tgt > self.lg_arr_longs {
            let lg_delta = lg_tgt - self.lg_arr_longs;
            self.force_resize_cache(self.rf.lg().min(lg_delta).max(1));
        } else {
            // At target size with nothing stale to clean; very rare.
            self.force_resize_cache(1);
        }
    }

    // Resize only: theta and count do not change.
    fn force_resize_cache(&mut self, lg_resize: u8) {
        self.lg_arr_longs += lg_resize;
        let mut tgt = vec![0u64; 1usize << self.lg_arr_longs];
        let count = hash_table::hash_array_insert(
            &self.cache,
            &mut tgt,
            self.lg_arr_longs,
            self.theta_long,
        );
        debug_assert_eq!(count, self.cur_count);
        self.cur_count = count;
        self.cache = tgt;
        self.hash_table_threshold = self.threshold_for(self.lg_arr_longs);
    }

    // Alpha update path

    fn alpha_variant(&self) -> (f64, u64, bool) {
        match self.variant {
            Variant::Alpha {
                alpha,
                split1,
                dirty,
            } => (alpha, split1, dirty),
            Variant::QuickSelect => unreachable!("alpha path on a QuickSelect sketch"),
        }
    }

    fn alpha_hash_update(&mut self, hash: u64) -> UpdateResult {
        let (alpha, split1, dirty) = self.alpha_variant();
        if dirty {
            // Must be at target size; the probe may reclaim stale slots.
            return self.enhanced_hash_insert(hash, alpha);
        }
        if !hash_table::hash_insert(&mut self.cache, self.lg_arr_longs, hash) {
            return UpdateResult::RejectedDuplicate;
        }
        self.cur_count += 1;
        if self.theta_long > split1 {
            // Not yet in sketch mode.
            if self.cur_count > (1usize << self.lg_nom_longs) {
                // The (k+1)-th insertion. Happens only once; the table is
                // already at target size by the growth thresholds.
                self.decrement_theta(alpha);
            } else if self.cur_count > self.hash_table_threshold {
                self.resize_cache();
            }
        } else {
            // Sketch mode on a clean table, e.g. right after a rebuild.
            debug_assert!(self.lg_arr_longs > self.lg_nom_longs);
            self.decrement_theta(alpha);
            if self.cur_count > self.hash_table_threshold {
                self.rebuild_dirty();
            }
        }
        UpdateResult::InsertedCountIncremented
    }

    /// Probe walk over a table that may hold stale (over-theta) slots.
    ///
    /// Phase one scans for the hash, an empty slot, or a stale slot.
    /// Finding a stale slot starts phase two: keep scanning to rule out a
    /// duplicate further along the probe path, then write into the
    /// remembered stale position.
    fn enhanced_hash_insert(&mut self, hash: u64, alpha: f64) -> UpdateResult {
        let mask = (1usize << self.lg_arr_longs) - 1;
        let stride = hash_table::stride(hash, self.lg_arr_longs);
        let mut probe = (hash as usize) & mask;
        let mut slot = self.cache[probe];

        while slot != hash && slot != 0 {
            if slot >= self.theta_long {
                let remember = probe;
                probe = (probe + stride) & mask;
                slot = self.cache[probe];
                while slot != hash && slot != 0 {
                    probe = (probe + stride) & mask;
                    slot = self.cache[probe];
                }
                if slot == hash {
                    return UpdateResult::RejectedDuplicate;
                }
                self.cache[remember] = hash;
                self.decrement_theta(alpha);
                return UpdateResult::InsertedCountNotIncremented;
            }
            probe = (probe + stride) & mask;
            slot = self.cache[probe];
        }

        if slot == hash {
            return UpdateResult::RejectedDuplicate;
        }
        debug_assert_eq!(slot, 0);
        self.cache[probe] = hash;
        self.decrement_theta(alpha);
        self.cur_count += 1;
        if self.cur_count > self.hash_table_threshold {
            self.rebuild_dirty();
        }
        UpdateResult::InsertedCountIncremented
    }

    // Every theta decrement may strand entries above theta, so the table
    // becomes dirty.
    fn decrement_theta(&mut self, alpha: f64) {
        self.theta_long = (self.theta_long as f64 * alpha) as u64;
        if let Variant::Alpha { dirty, .. } = &mut self.variant {
            *dirty = true;
        }
    }

    // Rehashes survivors into a fresh table of the same size. If that did
    // not reduce the count, the only way out is a forced resize.
    fn rebuild_dirty(&mut self) {
        let before = self.cur_count;
        self.force_rebuild_dirty_cache();
        if before == self.cur_count {
            self.force_resize_cache(1);
        }
    }

    fn force_rebuild_dirty_cache(&mut self) {
        let mut tgt = vec![0u64; self.cache.len()];
        self.cur_count = hash_table::hash_array_insert(
            &self.cache,
            &mut tgt,
            self.lg_arr_longs,
            self.theta_long,
        );
        self.cache = tgt;
        if let Variant::Alpha { dirty, .. } = &mut self.variant {
            *dirty = false;
        }
    }

    fn threshold_for(&self, lg_arr: u8) -> usize {
        let fraction = match self.variant {
            Variant::QuickSelect => {
                if lg_arr <= self.lg_nom_longs {
                    QS_RESIZE_THRESHOLD
                } else {
                    QS_REBUILD_THRESHOLD
                }
            }
            Variant::Alpha { .. } => {
                if lg_arr <= self.lg_nom_longs {
                    ALPHA_RESIZE_THRESHOLD
                } else {
                    ALPHA_REBUILD_THRESHOLD
                }
            }
        };
        (fraction * (1u64 << lg_arr) as f64).floor() as usize
    }

    // Read side

    /// Returns the cardinality estimate.
    ///
    /// Exact (the retained count) when the sketch is not in estimation
    /// mode.
    pub fn estimate(&self) -> f64 {
        if self.empty {
            return 0.0;
        }
        if !self.is_estimation_mode() {
            return self.cur_count as f64;
        }
        let theta = self.theta();
        match self.variant {
            Variant::QuickSelect => self.num_retained() as f64 / theta,
            Variant::Alpha { split1, .. } => {
                if self.theta_long > split1 {
                    self.num_retained() as f64 / theta
                } else {
                    // In sketch mode the valid count concentrates on k, and
                    // k / theta is the lower-variance estimator.
                    (1u64 << self.lg_nom_longs) as f64 / theta
                }
            }
        }
    }

    /// Returns the approximate lower bound given a number of standard
    /// deviations.
    pub fn lower_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if !self.is_estimation_mode() {
            return self.cur_count as f64;
        }
        match self.variant {
            Variant::QuickSelect => {
                // Theta is in (0, 1] whenever the sketch is valid, so the
                // bound cannot fail.
                binomial_bounds::lower_bound(self.num_retained() as u64, self.theta(), num_std_dev)
                    .expect("theta is in range")
            }
            Variant::Alpha { .. } => {
                let valid = self.num_retained();
                if valid == 0 {
                    return 0.0;
                }
                let sd = self.alpha_variance(valid).sqrt();
                (self.estimate() - num_std_dev.as_f64() * sd).max(0.0)
            }
        }
    }

    /// Returns the approximate upper bound given a number of standard
    /// deviations.
    pub fn upper_bound(&self, num_std_dev: NumStdDev) -> f64 {
        if !self.is_estimation_mode() {
            return self.cur_count as f64;
        }
        match self.variant {
            Variant::QuickSelect => binomial_bounds::upper_bound(
                self.num_retained() as u64,
                self.theta(),
                num_std_dev,
                self.empty,
            )
            .expect("theta is in range"),
            Variant::Alpha { .. } => {
                let sd = self.alpha_variance(self.num_retained()).sqrt();
                self.estimate() + num_std_dev.as_f64() * sd
            }
        }
    }

    fn alpha_variance(&self, valid_count: usize) -> f64 {
        let (alpha, _, _) = self.alpha_variant();
        alpha_variance(
            (1u64 << self.lg_nom_longs) as f64,
            self.p as f64,
            alpha,
            self.theta(),
            valid_count,
        )
    }

    /// Returns the number of retained entries below theta.
    pub fn num_retained(&self) -> usize {
        match self.variant {
            Variant::Alpha { dirty: true, .. } => {
                hash_table::count_below(&self.cache, self.theta_long)
            }
            _ => self.cur_count,
        }
    }

    /// Returns true if no update has ever reached the sketch.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Returns true if the estimate is a projection rather than an exact
    /// count.
    pub fn is_estimation_mode(&self) -> bool {
        self.theta_long < MAX_THETA
    }

    /// Returns theta as a fraction in (0, 1].
    pub fn theta(&self) -> f64 {
        self.theta_long as f64 / MAX_THETA_AS_F64
    }

    /// Returns theta in the long domain.
    pub fn theta64(&self) -> u64 {
        self.theta_long
    }

    /// Returns log2 of the nominal entry count.
    pub fn lg_k(&self) -> u8 {
        self.lg_nom_longs
    }

    /// Returns the 16-bit seed hash.
    pub fn seed_hash(&self) -> u16 {
        self.seed_hash
    }

    /// Returns the family of this sketch.
    pub fn family(&self) -> Family {
        match self.variant {
            Variant::QuickSelect => Family::QUICKSELECT,
            Variant::Alpha { .. } => Family::ALPHA,
        }
    }

    /// Returns an iterator over the retained hash values.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        let theta = self.theta_long;
        self.cache
            .iter()
            .copied()
            .filter(move |&v| v != 0 && v < theta)
    }

    /// Prunes the sketch back to its nominal size if it holds more.
    ///
    /// For the QuickSelect variant this runs the selection rebuild; for
    /// the Alpha variant it cleans stale entries out of a dirty table.
    pub fn rebuild(&mut self) {
        match self.variant {
            Variant::QuickSelect => {
                if self.cur_count > (1usize << self.lg_nom_longs) {
                    self.quick_select_and_rebuild();
                }
            }
            Variant::Alpha { dirty, .. } => {
                if dirty {
                    self.rebuild_dirty();
                }
            }
        }
    }

    /// Returns the sketch to its initial empty state.
    pub fn reset(&mut self) {
        let lg_arr = starting_lg_arr(self.lg_nom_longs, self.rf);
        if lg_arr == self.lg_arr_longs {
            self.cache.fill(0);
        } else {
            self.lg_arr_longs = lg_arr;
            self.cache = vec![0u64; 1usize << lg_arr];
        }
        self.hash_table_threshold = self.threshold_for(self.lg_arr_longs);
        self.empty = true;
        self.cur_count = 0;
        self.theta_long = theta_from_p(self.p);
        if let Variant::Alpha { dirty, .. } = &mut self.variant {
            *dirty = false;
        }
    }

    /// Returns this sketch in compact (immutable) form.
    ///
    /// If `ordered` is true the retained hashes are sorted ascending.
    pub fn compact(&self, ordered: bool) -> CompactThetaSketch {
        let entries: Vec<u64> = self.iter().collect();
        CompactThetaSketch::from_sketch_state(
            entries,
            self.theta_long,
            self.seed_hash,
            ordered,
            self.empty,
        )
    }

    // Serialization (hash-table form)

    /// Serializes this sketch in its resizable hash-table form.
    ///
    /// A dirty Alpha table is cleaned into the output, so a serialized
    /// sketch never carries stale slots.
    pub fn serialize(&self) -> Vec<u8> {
        let arr = self.cache.len();
        let mut bytes = SketchBytes::with_capacity(24 + arr * 8);
        bytes.write_u8(ser::UPDATE_PREAMBLE_LONGS | (self.rf.lg() << ser::LG_RESIZE_FACTOR_SHIFT));
        bytes.write_u8(ser::SERIAL_VERSION);
        bytes.write_u8(self.family().id);
        bytes.write_u8(self.lg_nom_longs);
        bytes.write_u8(self.lg_arr_longs);
        bytes.write_u8(if self.empty { ser::FLAG_EMPTY } else { 0 });
        bytes.write_u16_le(self.seed_hash);

        let dirty = matches!(self.variant, Variant::Alpha { dirty: true, .. });
        if dirty {
            let mut tgt = vec![0u64; arr];
            let count = hash_table::hash_array_insert(
                &self.cache,
                &mut tgt,
                self.lg_arr_longs,
                self.theta_long,
            );
            bytes.write_u32_le(count as u32);
            bytes.write_f32_le(self.p);
            bytes.write_u64_le(self.theta_long);
            for &slot in &tgt {
                bytes.write_u64_le(slot);
            }
        } else {
            bytes.write_u32_le(self.cur_count as u32);
            bytes.write_f32_le(self.p);
            bytes.write_u64_le(self.theta_long);
            for &slot in &self.cache {
                bytes.write_u64_le(slot);
            }
        }
        bytes.into_bytes()
    }

    /// Deserializes an update sketch written with the default seed.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Self::deserialize_with_seed(bytes, DEFAULT_UPDATE_SEED)
    }

    /// Deserializes an update sketch, validating it against the given
    /// seed.
    pub fn deserialize_with_seed(bytes: &[u8], seed: u64) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);
        let byte0 = cursor
            .read_u8()
            .map_err(insufficient_data("preamble_longs"))?;
        let pre_longs = byte0 & ser::PREAMBLE_LONGS_MASK;
        let rf = ResizeFactor::from_lg(byte0 >> ser::LG_RESIZE_FACTOR_SHIFT);
        let ser_ver = cursor
            .read_u8()
            .map_err(insufficient_data("serial_version"))?;
        ensure_serial_version_is(ser::SERIAL_VERSION, ser_ver)?;
        let family_id = cursor.read_u8().map_err(insufficient_data("family_id"))?;
        let is_alpha = match family_id {
            id if id == Family::ALPHA.id => true,
            id if id == Family::QUICKSELECT.id => false,
            _ => {
                return Err(Error::deserial(format!(
                    "family {family_id} is not an update sketch family"
                )))
            }
        };
        ensure_preamble_longs_is(ser::UPDATE_PREAMBLE_LONGS, pre_longs)?;

        let lg_nom = cursor.read_u8().map_err(insufficient_data("lg_nom"))?;
        let lg_arr = cursor.read_u8().map_err(insufficient_data("lg_arr"))?;
        let flags = cursor.read_u8().map_err(insufficient_data("flags"))?;
        if flags & ser::FLAG_BIG_ENDIAN != 0 {
            return Err(Error::deserial("big-endian sketches are not supported"));
        }
        if flags & ser::FLAG_COMPACT != 0 {
            return Err(Error::deserial("compact flag set on an update sketch blob"));
        }
        let empty = flags & ser::FLAG_EMPTY != 0;
        let stored_seed_hash = cursor
            .read_u16_le()
            .map_err(insufficient_data("seed_hash"))?;
        ensure_seed_hashes_match(compute_seed_hash(seed), stored_seed_hash)?;

        let cur_count = cursor
            .read_u32_le()
            .map_err(insufficient_data("cur_count"))? as usize;
        let p = cursor.read_f32_le().map_err(insufficient_data("p"))?;
        if !(p > 0.0 && p <= 1.0) {
            return Err(Error::deserial(format!("p out of range: {p}")));
        }
        let theta_long = cursor
            .read_u64_le()
            .map_err(insufficient_data("theta_long"))?;

        let min_lg_k = if is_alpha { ALPHA_MIN_LG_K } else { QS_MIN_LG_K };
        if !(min_lg_k..=MAX_LG_K).contains(&lg_nom) {
            return Err(Error::deserial(format!("corrupted: lg_nom {lg_nom}")));
        }
        if lg_arr < MIN_LG_ARR_LONGS || lg_arr > lg_nom + 1 {
            return Err(Error::deserial(format!("corrupted: lg_arr {lg_arr}")));
        }
        if theta_long > MAX_THETA {
            return Err(Error::deserial("corrupted: theta above maximum"));
        }
        // Theta only moves below its starting value once the table has
        // reached target size.
        if lg_arr <= lg_nom && theta_long < theta_from_p(p) {
            return Err(Error::deserial(
                "corrupted: theta decremented before the table reached target size",
            ));
        }
        let arr = 1usize << lg_arr;
        if cur_count > arr {
            return Err(Error::deserial("corrupted: cur_count exceeds table size"));
        }
        if empty && cur_count != 0 {
            return Err(Error::deserial("corrupted: empty sketch with entries"));
        }

        let mut cache = vec![0u64; arr];
        for slot in cache.iter_mut() {
            let v = cursor.read_u64_le().map_err(insufficient_data("table"))?;
            if v != 0 && v >= theta_long {
                return Err(Error::deserial("corrupted: table slot at or above theta"));
            }
            *slot = v;
        }

        let variant = if is_alpha {
            alpha_variant_for(lg_nom, p)
        } else {
            Variant::QuickSelect
        };
        let mut sketch = UpdateSketch {
            lg_nom_longs: lg_nom,
            seed,
            seed_hash: stored_seed_hash,
            p,
            rf,
            lg_arr_longs: lg_arr,
            hash_table_threshold: 0,
            cache,
            cur_count,
            theta_long,
            empty,
            variant,
        };
        sketch.hash_table_threshold = sketch.threshold_for(lg_arr);
        Ok(sketch)
    }
}

fn alpha_variant_for(lg_nom: u8, p: f32) -> Variant {
    let nom = (1u64 << lg_nom) as f64;
    let alpha = nom / (nom + 1.0);
    let split1 = ((p as f64) * (alpha + 1.0) / 2.0 * MAX_THETA_AS_F64) as u64;
    Variant::Alpha {
        alpha,
        split1,
        dirty: false,
    }
}

/// Estimator variance for the Alpha variant, split by insertion phase.
///
/// Phase 0 is plain sampling (theta above split1), phase 1 is the single
/// transition step, and phase 2 covers the geometric decrements beyond
/// it.
fn alpha_variance(k: f64, p: f64, alpha: f64, theta: f64, count: usize) -> f64 {
    let k_plus_1 = k + 1.0;
    let y = 1.0 / p;
    let y_sq_minus_y = y * y - y;
    let result = match alpha_phase(theta, alpha, p) {
        0 => count as f64 * y_sq_minus_y,
        1 => k_plus_1 * y_sq_minus_y,
        _ => {
            let b = 1.0 / alpha;
            let b_sq = b * b;
            let x = p / theta;
            let x_sq = x * x;
            let term1 = k_plus_1 * y_sq_minus_y;
            let term2 = y / (1.0 - b_sq);
            let term3 = y * b_sq - y * x_sq - b - b_sq + x + x * b;
            term1 + term2 * term3
        }
    };
    result + (1.0 - theta) / (theta * theta)
}

fn alpha_phase(theta: f64, alpha: f64, p: f64) -> u8 {
    let split1 = p * (alpha + 1.0) / 2.0;
    if theta > split1 {
        0
    } else if theta > alpha * split1 {
        1
    } else {
        2
    }
}

/// Builder for [`UpdateSketch`].
#[derive(Debug)]
pub struct UpdateSketchBuilder {
    family: Family,
    lg_k: u8,
    seed: u64,
    p: f32,
    rf: ResizeFactor,
}

impl Default for UpdateSketchBuilder {
    fn default() -> Self {
        Self {
            family: Family::QUICKSELECT,
            lg_k: DEFAULT_LG_K,
            seed: DEFAULT_UPDATE_SEED,
            p: 1.0,
            rf: ResizeFactor::X8,
        }
    }
}

impl UpdateSketchBuilder {
    /// Selects the sketch variant.
    ///
    /// # Panics
    ///
    /// Panics unless the family is [`Family::QUICKSELECT`] or
    /// [`Family::ALPHA`].
    pub fn family(mut self, family: Family) -> Self {
        assert!(
            family == Family::QUICKSELECT || family == Family::ALPHA,
            "family must be QuickSelect or Alpha, got {}",
            family.name
        );
        self.family = family;
        self
    }

    /// Sets log2 of the nominal entry count k.
    ///
    /// # Panics
    ///
    /// Panics if `lg_k` is not in `[4, 26]`. The Alpha variant further
    /// requires `lg_k >= 9`, checked at build time.
    pub fn lg_k(mut self, lg_k: u8) -> Self {
        assert!(
            (QS_MIN_LG_K..=MAX_LG_K).contains(&lg_k),
            "lg_k must be in [{QS_MIN_LG_K}, {MAX_LG_K}], got {lg_k}"
        );
        self.lg_k = lg_k;
        self
    }

    /// Sets the update hash seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the sampling probability p.
    ///
    /// # Panics
    ///
    /// Panics if `p` is not in `(0.0, 1.0]`.
    pub fn sampling_probability(mut self, p: f32) -> Self {
        assert!(
            p > 0.0 && p <= 1.0,
            "sampling probability must be in (0.0, 1.0], got {p}"
        );
        self.p = p;
        self
    }

    /// Sets the table resize factor.
    pub fn resize_factor(mut self, rf: ResizeFactor) -> Self {
        self.rf = rf;
        self
    }

    /// Builds the sketch.
    ///
    /// # Panics
    ///
    /// Panics if the Alpha family was selected with `lg_k < 9`.
    ///
    /// # Examples
    ///
    /// ```
    /// use theta_sketch::codec::family::Family;
    /// use theta_sketch::theta::UpdateSketch;
    ///
    /// let sketch = UpdateSketch::builder()
    ///     .family(Family::ALPHA)
    ///     .lg_k(10)
    ///     .build();
    /// assert_eq!(sketch.lg_k(), 10);
    /// ```
    pub fn build(self) -> UpdateSketch {
        let variant = if self.family == Family::ALPHA {
            assert!(
                self.lg_k >= ALPHA_MIN_LG_K,
                "the Alpha variant requires lg_k of at least {ALPHA_MIN_LG_K}, got {}",
                self.lg_k
            );
            alpha_variant_for(self.lg_k, self.p)
        } else {
            Variant::QuickSelect
        };
        let lg_arr = starting_lg_arr(self.lg_k, self.rf);
        let mut sketch = UpdateSketch {
            lg_nom_longs: self.lg_k,
            seed: self.seed,
            seed_hash: compute_seed_hash(self.seed),
            p: self.p,
            rf: self.rf,
            lg_arr_longs: lg_arr,
            hash_table_threshold: 0,
            cache: vec![0u64; 1usize << lg_arr],
            cur_count: 0,
            theta_long: theta_from_p(self.p),
            empty: true,
            variant,
        };
        sketch.hash_table_threshold = sketch.threshold_for(lg_arr);
        sketch
    }
}
