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

//! Serialization constants for the theta family.
//!
//! The preamble is byte-addressed, little-endian:
//!
//! | Offset | Size | Field                                           |
//! |--------|------|-------------------------------------------------|
//! | 0      | 1    | preamble longs (low 6 bits), lg(rf) (bits 6..7) |
//! | 1      | 1    | serializer version                              |
//! | 2      | 1    | family id                                       |
//! | 3      | 1    | lg_nom (update form; unused in compact)         |
//! | 4      | 1    | lg_arr (update form; unused in compact)         |
//! | 5      | 1    | flags                                           |
//! | 6      | 2    | seed hash                                       |
//! | 8      | 4    | retained entries                                |
//! | 12     | 4    | p as float (update form; unused in compact)     |
//! | 16     | 8    | theta                                           |
//! | 24..   | 8n   | hash table slots or compact sorted entries      |
//!
//! Update sketches always use three preamble longs. The compact form uses
//! one long when empty, two for an exact-mode single entry (the entry
//! follows at offset 16), and three otherwise.

pub(crate) const SERIAL_VERSION: u8 = 3;

pub(crate) const UPDATE_PREAMBLE_LONGS: u8 = 3;
pub(crate) const COMPACT_PREAMBLE_LONGS_EMPTY: u8 = 1;
pub(crate) const COMPACT_PREAMBLE_LONGS_SINGLE: u8 = 2;
pub(crate) const COMPACT_PREAMBLE_LONGS_GENERAL: u8 = 3;

pub(crate) const FLAG_BIG_ENDIAN: u8 = 1;
pub(crate) const FLAG_READ_ONLY: u8 = 1 << 1;
pub(crate) const FLAG_EMPTY: u8 = 1 << 2;
pub(crate) const FLAG_COMPACT: u8 = 1 << 3;
pub(crate) const FLAG_ORDERED: u8 = 1 << 4;

pub(crate) const PREAMBLE_LONGS_MASK: u8 = 0x3F;
pub(crate) const LG_RESIZE_FACTOR_SHIFT: u8 = 6;
