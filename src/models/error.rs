// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::quadrature::QuadratureError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("An energy axis needs at least one energy")]
    EmptyEnergyAxis,

    #[error("Energy axis values must be positive and finite; entry {index} is {value} J")]
    BadEnergy { index: usize, value: f64 },

    #[error("Energy axis values must be strictly ascending; entry {index} ({value} J) is not larger than the one before it")]
    UnsortedEnergyAxis { index: usize, value: f64 },

    #[error("An energy scale factor must be finite and larger than 1; got {0}")]
    BadScaleFactor(f64),

    #[error("Model parameter '{name}' must be positive and finite; got {value}")]
    BadParameter { name: &'static str, value: f64 },

    #[error(transparent)]
    Quadrature(#[from] QuadratureError),
}
