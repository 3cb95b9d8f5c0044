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

//! Serde support for compact sketches, enabled by the `with_serde`
//! feature.
//!
//! The serde representation is the sketch's own binary format wrapped in
//! a byte buffer, so any serde data format can carry a sketch without a
//! second layout. Deserialization trusts the seed hash embedded in the
//! blob; when seeds must be enforced, exchange raw bytes and use
//! [`CompactThetaSketch::deserialize_with_seed`] instead.

use serde::de;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::theta::compact::CompactThetaSketch;

impl Serialize for CompactThetaSketch {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.serialize())
    }
}

impl<'de> Deserialize<'de> for CompactThetaSketch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        CompactThetaSketch::deserialize_inner(&bytes, None)
            .map_err(|err| de::Error::custom(err.message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theta::UpdateSketch;

    #[test]
    fn serde_round_trip() {
        let mut sketch = UpdateSketch::builder().lg_k(5).build();
        for i in 0..5000u64 {
            sketch.update_u64(i);
        }
        let compact = sketch.compact(true);

        let json = serde_json::to_string(&compact).unwrap();
        let decoded: CompactThetaSketch = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, compact);
        assert_eq!(decoded.estimate(), compact.estimate());
    }

    #[test]
    fn serde_rejects_garbage() {
        let result: Result<CompactThetaSketch, _> = serde_json::from_str("[1, 2, 3]");
        assert!(result.is_err());
    }
}
