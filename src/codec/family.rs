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

//! Sketch family descriptors.
//!
//! The family id is byte 2 of every serialized preamble and distinguishes
//! sketch types that would otherwise share a layout. Combining operations
//! check it before touching the rest of the blob.

use crate::error::Error;

/// Identity of a sketch family in the serialized preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Family {
    /// Family id stored in the preamble.
    pub id: u8,
    /// Minimum number of preamble longs for this family.
    pub min_pre_longs: u8,
    /// Maximum number of preamble longs for this family.
    pub max_pre_longs: u8,
    /// Human-readable family name used in error messages.
    pub name: &'static str,
}

impl Family {
    /// The Alpha update sketch family.
    pub const ALPHA: Family = Family {
        id: 1,
        min_pre_longs: 3,
        max_pre_longs: 3,
        name: "Alpha",
    };

    /// The QuickSelect update sketch family.
    pub const QUICKSELECT: Family = Family {
        id: 2,
        min_pre_longs: 3,
        max_pre_longs: 3,
        name: "QuickSelect",
    };

    /// The compact (immutable) sketch family.
    pub const COMPACT: Family = Family {
        id: 3,
        min_pre_longs: 1,
        max_pre_longs: 3,
        name: "Compact",
    };

    /// The union set-operation family.
    pub const UNION: Family = Family {
        id: 4,
        min_pre_longs: 4,
        max_pre_longs: 4,
        name: "Union",
    };

    /// Fails unless `actual` matches this family's id.
    pub fn validate_id(&self, actual: u8) -> Result<(), Error> {
        if actual == self.id {
            Ok(())
        } else {
            Err(Error::invalid_family(self.id, actual, self.name))
        }
    }
}
