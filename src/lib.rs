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

//! Theta sketches for streaming cardinality estimation.
//!
//! A theta sketch estimates the number of distinct items in a stream
//! using bounded memory. Sketches are mergeable: unions, intersections,
//! and set differences of sketches built with the same seed are
//! themselves sketches, and every estimate comes with confidence bounds.
//!
//! # Quick start
//!
//! ```
//! use theta_sketch::common::NumStdDev;
//! use theta_sketch::theta::UpdateSketch;
//!
//! let mut sketch = UpdateSketch::builder().lg_k(12).build();
//! for i in 0..100_000u64 {
//!     sketch.update_u64(i);
//! }
//!
//! let estimate = sketch.estimate();
//! assert!(sketch.lower_bound(NumStdDev::Two) <= estimate);
//! assert!(estimate <= sketch.upper_bound(NumStdDev::Two));
//! ```
//!
//! # Serialization
//!
//! Update sketches serialize in a resizable hash-table form; compact
//! sketches serialize in a smaller read-only form suitable for storage
//! and merging. Both carry a preamble with a seed hash so incompatible
//! sketches are rejected instead of silently merged.

pub mod codec;
pub mod common;
pub mod error;
pub mod hash;
pub mod theta;
