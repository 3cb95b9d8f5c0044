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

//! Theta sketch family for streaming distinct-count estimation.
//!
//! A theta sketch keeps a uniform random sample of the hashed input: every
//! hash below the moving threshold theta is retained, and the cardinality
//! estimate is the retained count divided by theta. Two update variants
//! are provided through one builder:
//!
//! - **QuickSelect** (the default) lets the hash table fill to a
//!   threshold, then prunes back to the nominal size k with a selection
//!   pass. It is the preferred general-purpose variant and the merge
//!   target for unions.
//! - **Alpha** decrements theta geometrically once k entries have been
//!   seen and cleans stale entries lazily. It trades a more intricate
//!   update path for lower estimator variance on a single stream.
//!
//! Sketches with the same seed can be combined with [`Union`],
//! [`Intersection`], and [`a_not_b`], all of which produce a
//! [`CompactThetaSketch`] snapshot.

mod a_not_b;
mod compact;
mod hash_table;
mod intersection;
pub(crate) mod serialization;
mod sketch;
mod union;

#[cfg(feature = "with_serde")]
mod serde;

pub use self::a_not_b::a_not_b;
pub use self::compact::CompactThetaSketch;
pub use self::hash_table::MAX_THETA;
pub use self::intersection::Intersection;
pub use self::sketch::UpdateResult;
pub use self::sketch::UpdateSketch;
pub use self::sketch::UpdateSketchBuilder;
pub use self::union::Union;
pub use self::union::UnionBuilder;
