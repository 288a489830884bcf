// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{check_positive, cylindrical, IonizedGasDensity, ModelError, NeutralGasDensity};
use crate::{constants::*, coord::Position};

/// A gas disk whose density falls exponentially with cylindrical radius and
/// with height above the plane. Usable as ionized or neutral gas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDisk {
    /// Density at the Galactic centre \[m^-3\].
    central_density: f64,

    /// \[m\]
    radial_scale: f64,

    /// \[m\]
    vertical_scale: f64,

    /// \[K\]
    temperature: f64,
}

impl ExponentialDisk {
    pub fn new(
        central_density: f64,
        radial_scale: f64,
        vertical_scale: f64,
        temperature: f64,
    ) -> Result<ExponentialDisk, ModelError> {
        Ok(ExponentialDisk {
            central_density: check_positive("central density", central_density)?,
            radial_scale: check_positive("radial scale", radial_scale)?,
            vertical_scale: check_positive("vertical scale", vertical_scale)?,
            temperature: check_positive("temperature", temperature)?,
        })
    }

    /// The warm ionized medium: about 0.03 electrons per cm^3 near the Sun,
    /// 1 kpc scale height, 10^4 K.
    pub fn warm_ionized_medium() -> ExponentialDisk {
        let radial_scale = 15.0 * KPC;
        ExponentialDisk {
            central_density: 0.03 / (CM * CM * CM) * (DEFAULT_OBSERVER_X / radial_scale).exp(),
            radial_scale,
            vertical_scale: 1.0 * KPC,
            temperature: 1e4,
        }
    }

    /// Atomic hydrogen: about 1 atom per cm^3 near the Sun in a thin disk.
    pub fn neutral_hydrogen() -> ExponentialDisk {
        let radial_scale = 7.0 * KPC;
        ExponentialDisk {
            central_density: 1.0 / (CM * CM * CM) * (DEFAULT_OBSERVER_X / radial_scale).exp(),
            radial_scale,
            vertical_scale: 0.15 * KPC,
            temperature: 100.0,
        }
    }

    pub fn density_at(&self, pos: &Position) -> f64 {
        let (r, z) = cylindrical(pos);
        self.central_density * (-r / self.radial_scale - z.abs() / self.vertical_scale).exp()
    }
}

impl IonizedGasDensity for ExponentialDisk {
    fn density(&self, pos: &Position) -> f64 {
        self.density_at(pos)
    }

    fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl NeutralGasDensity for ExponentialDisk {
    fn density(&self, pos: &Position) -> f64 {
        self.density_at(pos)
    }
}
