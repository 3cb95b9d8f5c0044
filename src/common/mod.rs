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

//! Types and helpers shared across sketch families.

pub mod binomial_bounds;
pub(crate) mod quick_select;

/// Number of standard deviations for confidence bounds.
///
/// Restricting the choice to one, two, or three standard deviations keeps
/// invalid values unrepresentable at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumStdDev {
    /// One standard deviation (~68% confidence).
    One,
    /// Two standard deviations (~95% confidence).
    Two,
    /// Three standard deviations (~99.7% confidence).
    Three,
}

impl NumStdDev {
    /// Returns the number of standard deviations as a float.
    pub fn as_f64(self) -> f64 {
        match self {
            NumStdDev::One => 1.0,
            NumStdDev::Two => 2.0,
            NumStdDev::Three => 3.0,
        }
    }
}

/// Hash-table growth factor for update sketches.
///
/// Encoded in two bits of the serialized preamble. `X1` disables staged
/// growth: the table is allocated at its target size up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFactor {
    /// No resizing; start at target size.
    X1,
    /// Double on each resize.
    X2,
    /// Quadruple on each resize.
    X4,
    /// Grow eightfold on each resize.
    X8,
}

impl ResizeFactor {
    /// Returns log2 of the growth factor.
    pub fn lg(self) -> u8 {
        match self {
            ResizeFactor::X1 => 0,
            ResizeFactor::X2 => 1,
            ResizeFactor::X4 => 2,
            ResizeFactor::X8 => 3,
        }
    }

    /// Decodes the two-bit preamble encoding.
    pub fn from_lg(lg: u8) -> ResizeFactor {
        match lg & 0x3 {
            0 => ResizeFactor::X1,
            1 => ResizeFactor::X2,
            2 => ResizeFactor::X4,
            _ => ResizeFactor::X8,
        }
    }
}

/// Returns the canonical bit pattern of a double for hashing.
///
/// Negative zero maps to positive zero and every NaN form maps to the
/// single canonical quiet NaN, so all representations of an equal value
/// hash identically.
pub fn canonical_double(value: f64) -> u64 {
    if value.is_nan() {
        return 0x7ff8_0000_0000_0000;
    }
    if value == 0.0 {
        return 0;
    }
    value.to_bits()
}
