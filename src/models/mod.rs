// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The physical models consulted along a line of sight.
//!
//! Integrators only see these traits. Every implementation is shared between
//! worker threads, so it must be immutable after construction or protect any
//! internal memoization itself (see [`crate::memo`]).
//!
//! The concrete models here are simple analytic stand-ins. They are good
//! enough to produce physically sensible maps and to test the integrators.

mod cosmic_rays;
mod cross_sections;
mod dark_matter;
mod error;
mod gas;
mod magnetic_field;
mod photon_field;

pub use cosmic_rays::PowerLawCosmicRays;
pub use cross_sections::{
    BreitWheeler, BremsstrahlungCrossSection, BremsstrahlungTarget, KleinNishina,
    MemoizedThreeBody, PionDecayCrossSection, HE_ABUNDANCE,
};
pub use dark_matter::{NfwProfile, QuarkContinuumSpectrum, CRITICAL_DENSITY};
pub use error::ModelError;
pub use gas::ExponentialDisk;
pub use magnetic_field::{ToroidalField, UniformField};
pub use photon_field::BlackbodyPhotonField;
pub(crate) use photon_field::blackbody_number_density;

use nalgebra::Vector3;
use vec1::Vec1;

use crate::coord::Position;

/// Free electrons.
pub trait IonizedGasDensity: Send + Sync {
    /// \[m^-3\]
    fn density(&self, pos: &Position) -> f64;

    /// Electron temperature \[K\].
    fn temperature(&self) -> f64;
}

/// Neutral (atomic) hydrogen.
pub trait NeutralGasDensity: Send + Sync {
    /// \[m^-3\]
    fn density(&self, pos: &Position) -> f64;
}

pub trait MagneticField: Send + Sync {
    /// \[T\]
    fn field(&self, pos: &Position) -> Vector3<f64>;
}

/// A cosmic-ray species with a spectrum tabulated on an energy axis.
pub trait CosmicRayDensity: Send + Sync {
    fn energy_axis(&self) -> &EnergyAxis;

    /// Differential number density at the given total particle energy
    /// \[m^-3 J^-1\].
    fn density_per_energy(&self, energy: f64, pos: &Position) -> f64;
}

/// A photon field with a spectrum tabulated on an energy axis.
pub trait PhotonField: Send + Sync {
    fn energy_axis(&self) -> &EnergyAxis;

    /// `ε² dn/dε` at the `index`th photon energy `ε` of the axis \[J m^-3\].
    fn energy_density(&self, pos: &Position, index: usize) -> f64;
}

/// A differential cross section `dσ/dE` for a projectile of energy `e_proj`
/// producing a secondary of energy `e_secondary` \[m^2 J^-1\].
pub trait DifferentialCrossSection: Send + Sync {
    fn diff_cross_section(&self, e_proj: f64, e_secondary: f64) -> f64;
}

/// A differential cross section `dσ/dE_γ` for a projectile of energy `e_proj`
/// scattering a target photon of energy `e_target` into a photon of energy
/// `e_gamma` \[m^2 J^-1\].
pub trait ThreeBodyCrossSection: Send + Sync {
    fn diff_cross_section(&self, e_proj: f64, e_target: f64, e_gamma: f64) -> f64;
}

/// A spherical halo of dark matter centred on the Galactic centre.
pub trait DarkMatterProfile: Send + Sync {
    /// Mass density at galactocentric radius `r` \[kg m^-3\].
    fn mass_density(&self, r: f64) -> f64;
}

/// The gamma rays produced when two dark-matter particles annihilate.
pub trait DarkMatterSpectrum: Send + Sync {
    /// `m_χ c²` \[J\].
    fn rest_mass_energy(&self) -> f64;

    /// Photons per annihilation per unit photon energy \[J^-1\].
    fn particles_per_energy(&self, e_gamma: f64) -> f64;
}

/// The energies a spectrum is tabulated on.
///
/// A geometric axis has a constant ratio between neighbouring energies, and
/// integrals over it are done in log space. Any other tabulation is summed
/// with the energy differences between neighbours as weights.
#[derive(Debug, Clone, PartialEq)]
pub enum EnergyAxis {
    Tabulated(Vec1<f64>),
    Geometric {
        energies: Vec1<f64>,
        scale_factor: f64,
    },
}

fn validate_energies(energies: &[f64]) -> Result<(), ModelError> {
    for (index, &value) in energies.iter().enumerate() {
        if !(value > 0.0 && value.is_finite()) {
            return Err(ModelError::BadEnergy { index, value });
        }
        if index > 0 && value <= energies[index - 1] {
            return Err(ModelError::UnsortedEnergyAxis { index, value });
        }
    }
    Ok(())
}

impl EnergyAxis {
    /// An irregular axis. The energies must be positive and strictly
    /// ascending.
    pub fn tabulated(energies: Vec<f64>) -> Result<EnergyAxis, ModelError> {
        let energies = Vec1::try_from_vec(energies).map_err(|_| ModelError::EmptyEnergyAxis)?;
        validate_energies(&energies)?;
        Ok(EnergyAxis::Tabulated(energies))
    }

    /// `min, min·s, min·s², ...` up to and including `max` (within rounding).
    pub fn geometric(min: f64, max: f64, scale_factor: f64) -> Result<EnergyAxis, ModelError> {
        if !(scale_factor > 1.0 && scale_factor.is_finite()) {
            return Err(ModelError::BadScaleFactor(scale_factor));
        }
        if !(min > 0.0 && min.is_finite()) {
            return Err(ModelError::BadEnergy {
                index: 0,
                value: min,
            });
        }
        if !(max.is_finite() && max >= min) {
            return Err(ModelError::UnsortedEnergyAxis {
                index: 1,
                value: max,
            });
        }

        let n = ((max / min).ln() / scale_factor.ln() + 1e-9).floor() as usize + 1;
        let mut energies = Vec1::new(min);
        for i in 1..n {
            energies.push(min * scale_factor.powi(i as i32));
        }
        Ok(EnergyAxis::Geometric {
            energies,
            scale_factor,
        })
    }

    /// A geometric axis with `steps` energies from `min` to `max` inclusive.
    pub fn geometric_with_steps(min: f64, max: f64, steps: usize) -> Result<EnergyAxis, ModelError> {
        if steps < 2 || !(max > min) {
            return Err(ModelError::UnsortedEnergyAxis {
                index: steps.min(1),
                value: max,
            });
        }
        let scale_factor = (max / min).powf(1.0 / (steps - 1) as f64);
        if !(scale_factor > 1.0 && scale_factor.is_finite()) {
            return Err(ModelError::BadScaleFactor(scale_factor));
        }
        let energies = Vec1::try_from_vec(
            (0..steps)
                .map(|i| min * scale_factor.powi(i as i32))
                .collect(),
        )
        .map_err(|_| ModelError::EmptyEnergyAxis)?;
        validate_energies(&energies)?;
        Ok(EnergyAxis::Geometric {
            energies,
            scale_factor,
        })
    }

    pub fn energies(&self) -> &[f64] {
        match self {
            EnergyAxis::Tabulated(e) => e,
            EnergyAxis::Geometric { energies, .. } => energies,
        }
    }

    /// Are the energies a geometric sequence?
    pub fn exists_scale_factor(&self) -> bool {
        matches!(self, EnergyAxis::Geometric { .. })
    }

    pub fn scale_factor(&self) -> Option<f64> {
        match self {
            EnergyAxis::Tabulated(_) => None,
            EnergyAxis::Geometric { scale_factor, .. } => Some(*scale_factor),
        }
    }

    pub fn num_energies(&self) -> usize {
        self.energies().len()
    }

    /// Index of the first energy that is at least `energy`; equal to
    /// [`EnergyAxis::num_energies`] if there isn't one.
    pub fn first_index_at_or_above(&self, energy: f64) -> usize {
        self.energies().partition_point(|&e| e < energy)
    }
}

/// The cylindrical radius and height of a galactocentric position.
pub(crate) fn cylindrical(pos: &Position) -> (f64, f64) {
    (pos.x.hypot(pos.y), pos.z)
}

pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<f64, ModelError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ModelError::BadParameter { name, value })
    }
}
