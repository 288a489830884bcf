// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::{healpix::HealpixError, integrator::IntegratorError};

#[derive(Error, Debug)]
pub enum SkymapError {
    #[error("A skymap range needs 0 < min <= max and at least one step, but got min = {min}, max = {max}, steps = {steps}")]
    BadRange { min: f64, max: f64, steps: usize },

    #[error("Skymap parameter {0} is not finite")]
    BadParameter(f64),

    #[error(transparent)]
    Healpix(#[from] HealpixError),

    #[error(transparent)]
    Integrator(#[from] IntegratorError),
}
