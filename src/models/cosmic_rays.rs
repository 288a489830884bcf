// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{check_positive, cylindrical, CosmicRayDensity, EnergyAxis, ModelError};
use crate::{constants::*, coord::Position};

/// A power-law spectrum `n(E) = n₀ (E/E₀)^-α`, scaled by a disk profile that
/// is 1 at the Sun.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerLawCosmicRays {
    axis: EnergyAxis,

    /// `n₀` at the Sun \[m^-3 J^-1\].
    normalisation: f64,

    /// `E₀` \[J\]
    reference_energy: f64,

    /// `α`
    spectral_index: f64,

    /// \[m\]
    radial_scale: f64,

    /// \[m\]
    vertical_scale: f64,
}

impl PowerLawCosmicRays {
    pub fn new(
        axis: EnergyAxis,
        normalisation: f64,
        reference_energy: f64,
        spectral_index: f64,
    ) -> Result<PowerLawCosmicRays, ModelError> {
        if !spectral_index.is_finite() {
            return Err(ModelError::BadParameter {
                name: "spectral index",
                value: spectral_index,
            });
        }
        Ok(PowerLawCosmicRays {
            axis,
            normalisation: check_positive("normalisation", normalisation)?,
            reference_energy: check_positive("reference energy", reference_energy)?,
            spectral_index,
            radial_scale: 8.0 * KPC,
            vertical_scale: 1.0 * KPC,
        })
    }

    /// Change the scales of the disk profile.
    pub fn with_spatial_scales(
        mut self,
        radial_scale: f64,
        vertical_scale: f64,
    ) -> Result<PowerLawCosmicRays, ModelError> {
        self.radial_scale = check_positive("radial scale", radial_scale)?;
        self.vertical_scale = check_positive("vertical scale", vertical_scale)?;
        Ok(self)
    }

    /// Electrons with roughly the locally measured spectrum (index 3.1).
    pub fn local_electrons(axis: EnergyAxis) -> PowerLawCosmicRays {
        PowerLawCosmicRays {
            axis,
            normalisation: 6.3e-6 / GEV,
            reference_energy: GEV,
            spectral_index: 3.1,
            radial_scale: 8.0 * KPC,
            vertical_scale: 1.0 * KPC,
        }
    }

    /// Protons with roughly the locally measured spectrum (index 2.7).
    pub fn local_protons(axis: EnergyAxis) -> PowerLawCosmicRays {
        PowerLawCosmicRays {
            axis,
            normalisation: 7.5e-4 / GEV,
            reference_energy: GEV,
            spectral_index: 2.7,
            radial_scale: 8.0 * KPC,
            vertical_scale: 1.0 * KPC,
        }
    }

    fn profile(&self, pos: &Position) -> f64 {
        let (r, z) = cylindrical(pos);
        (-(r - DEFAULT_OBSERVER_X) / self.radial_scale - z.abs() / self.vertical_scale).exp()
    }
}

impl CosmicRayDensity for PowerLawCosmicRays {
    fn energy_axis(&self) -> &EnergyAxis {
        &self.axis
    }

    fn density_per_energy(&self, energy: f64, pos: &Position) -> f64 {
        self.normalisation
            * (energy / self.reference_energy).powf(-self.spectral_index)
            * self.profile(pos)
    }
}
