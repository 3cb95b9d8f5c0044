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

//! Confidence bounds for sketches that retain each hash below theta
//! independently.
//!
//! The retained count is binomial in the unknown cardinality at rate
//! theta. The bounds use the normal approximation of that binomial: the
//! standard deviation of the estimate `n / theta` is
//! `sqrt(n * (1 - theta)) / theta`. The lower bound is additionally
//! clamped to the retained count, which is always a set of distinct
//! values actually observed.

use crate::common::NumStdDev;
use crate::error::Error;

fn check_theta(theta: f64) -> Result<(), Error> {
    if theta > 0.0 && theta <= 1.0 {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "theta must be in (0, 1], got {theta}"
        )))
    }
}

fn std_dev_of_estimate(num_samples: u64, theta: f64) -> f64 {
    (num_samples as f64 * (1.0 - theta)).sqrt() / theta
}

/// Returns the approximate lower bound on the cardinality.
pub fn lower_bound(num_samples: u64, theta: f64, num_std_dev: NumStdDev) -> Result<f64, Error> {
    check_theta(theta)?;
    let n = num_samples as f64;
    if theta == 1.0 || num_samples == 0 {
        return Ok(n);
    }
    let est = n / theta;
    let lb = est - num_std_dev.as_f64() * std_dev_of_estimate(num_samples, theta);
    Ok(lb.max(n))
}

/// Returns the approximate upper bound on the cardinality.
pub fn upper_bound(
    num_samples: u64,
    theta: f64,
    num_std_dev: NumStdDev,
    empty: bool,
) -> Result<f64, Error> {
    check_theta(theta)?;
    if empty {
        return Ok(0.0);
    }
    let n = num_samples as f64;
    if theta == 1.0 {
        return Ok(n);
    }
    let est = n / theta;
    Ok(est + num_std_dev.as_f64() * std_dev_of_estimate(num_samples, theta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_mode_returns_count() {
        assert_eq!(lower_bound(100, 1.0, NumStdDev::Two).unwrap(), 100.0);
        assert_eq!(upper_bound(100, 1.0, NumStdDev::Two, false).unwrap(), 100.0);
    }

    #[test]
    fn bounds_bracket_the_estimate() {
        let n = 4096u64;
        let theta = 0.25;
        let est = n as f64 / theta;
        for nsd in [NumStdDev::One, NumStdDev::Two, NumStdDev::Three] {
            let lb = lower_bound(n, theta, nsd).unwrap();
            let ub = upper_bound(n, theta, nsd, false).unwrap();
            assert!(lb <= est && est <= ub, "lb {lb} est {est} ub {ub}");
        }
    }

    #[test]
    fn bounds_widen_with_more_std_devs() {
        let n = 1000u64;
        let theta = 0.1;
        let lb1 = lower_bound(n, theta, NumStdDev::One).unwrap();
        let lb3 = lower_bound(n, theta, NumStdDev::Three).unwrap();
        let ub1 = upper_bound(n, theta, NumStdDev::One, false).unwrap();
        let ub3 = upper_bound(n, theta, NumStdDev::Three, false).unwrap();
        assert!(lb3 <= lb1);
        assert!(ub3 >= ub1);
    }

    #[test]
    fn lower_bound_never_below_retained_count() {
        // Tiny theta with few samples would push the naive bound negative.
        let lb = lower_bound(2, 0.001, NumStdDev::Three).unwrap();
        assert!(lb >= 2.0);
    }

    #[test]
    fn empty_upper_bound_is_zero() {
        assert_eq!(upper_bound(0, 0.5, NumStdDev::Three, true).unwrap(), 0.0);
    }

    #[test]
    fn invalid_theta_is_rejected() {
        assert!(lower_bound(10, 0.0, NumStdDev::One).is_err());
        assert!(upper_bound(10, 1.5, NumStdDev::One, false).is_err());
    }
}
