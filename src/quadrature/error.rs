// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum QuadratureError {
    #[error("A quadrature rule was asked to use 0 steps")]
    ZeroSteps,

    #[error("Simpson's rule needs an even number of steps, but got {0}")]
    OddSimpsonSteps(usize),

    #[error("Integration bounds [{lower}, {upper}] are not finite")]
    NonFiniteBounds { lower: f64, upper: f64 },

    #[error("The integrand was not finite at x = {x}")]
    NonFinite { x: f64 },

    #[error("Adaptive quadrature over [{lower}, {upper}] did not converge within {limit} subdivisions (estimate {estimate:e}, error estimate {error_estimate:e})")]
    NoConvergence {
        lower: f64,
        upper: f64,
        estimate: f64,
        error_estimate: f64,
        limit: usize,
    },
}
