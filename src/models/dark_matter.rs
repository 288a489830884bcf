// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Galactic dark-matter haloes and the gamma-ray spectra of annihilating
//! dark-matter particles.

use super::{check_positive, DarkMatterProfile, DarkMatterSpectrum, ModelError};
use crate::{
    constants::*,
    quadrature::{qag, QuadratureError},
};

/// The critical density of the Universe \[kg m^-3\] (WMAP 9-year).
pub const CRITICAL_DENSITY: f64 = 9.1e-30 * GRAM / (CM * CM * CM);

/// A generalised NFW halo, `ρ(r) = ρ_s / ((r/r_s)^γ (1 + r/r_s)^(3-γ))`,
/// normalised so that the mean density inside `R_200` is 200 times the
/// critical density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NfwProfile {
    /// Inner slope `γ`; 1 is the classic NFW halo.
    gamma: f64,

    concentration: f64,

    /// \[kg\]
    m_200: f64,

    /// \[m\]
    r_200: f64,

    /// \[m\]
    scale_radius: f64,

    /// \[kg m^-3\]
    scale_density: f64,
}

fn nfw_shape(x: f64, gamma: f64) -> f64 {
    1.0 / (x.powf(gamma) * (1.0 + x).powf(3.0 - gamma))
}

/// `∫₀^c x² f(x) dx`; the mass inside `c` scale radii in units of
/// `4π ρ_s r_s³`.
fn enclosed_mass_integral(concentration: f64, gamma: f64) -> Result<f64, QuadratureError> {
    if gamma == 1.0 {
        return Ok((1.0 + concentration).ln() - concentration / (1.0 + concentration));
    }
    qag(
        |x| {
            if x == 0.0 {
                0.0
            } else {
                x * x * nfw_shape(x, gamma)
            }
        },
        0.0,
        concentration,
        1e-7,
        DEFAULT_QAG_LIMIT,
    )
}

impl NfwProfile {
    /// `gamma` must be in `[0, 2)` for the halo's mass to be finite and its
    /// scale radius positive.
    pub fn new(gamma: f64, concentration: f64, m_200: f64) -> Result<NfwProfile, ModelError> {
        if !(0.0..2.0).contains(&gamma) {
            return Err(ModelError::BadParameter {
                name: "inner slope",
                value: gamma,
            });
        }
        let concentration = check_positive("concentration", concentration)?;
        let m_200 = check_positive("halo mass", m_200)?;

        let r_200 = (3.0 * m_200 / (4.0 * PI * 200.0 * CRITICAL_DENSITY)).cbrt();
        let scale_radius = r_200 / ((2.0 - gamma) * concentration);
        let scale_density = 200.0 * CRITICAL_DENSITY * concentration.powi(3)
            / 3.0
            / enclosed_mass_integral(concentration, gamma)?;
        Ok(NfwProfile {
            gamma,
            concentration,
            m_200,
            r_200,
            scale_radius,
            scale_density,
        })
    }

    /// The Milky Way's halo after Battaglia et al. (2005): an NFW profile with
    /// a concentration of 18 and `M_200 = 5.6×10^11 M_☉`.
    pub fn milky_way() -> NfwProfile {
        NfwProfile::new(1.0, 18.0, 0.7 * 8e11 * SOLAR_MASS)
            .expect("constant halo parameters are valid")
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    pub fn m_200(&self) -> f64 {
        self.m_200
    }

    pub fn r_200(&self) -> f64 {
        self.r_200
    }

    pub fn scale_radius(&self) -> f64 {
        self.scale_radius
    }

    pub fn scale_density(&self) -> f64 {
        self.scale_density
    }
}

impl DarkMatterProfile for NfwProfile {
    fn mass_density(&self, r: f64) -> f64 {
        self.scale_density * nfw_shape(r / self.scale_radius, self.gamma)
    }
}

/// Photons per annihilation from hadronising quark pairs, using the fit of
/// Bergström, Ullio & Buckley (1998): `dN/dx = 0.73 e^(-7.8x) / x^1.5` with
/// `x = E_γ / m_χ c²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarkContinuumSpectrum {
    /// \[J\]
    rest_mass_energy: f64,
}

impl QuarkContinuumSpectrum {
    pub fn new(rest_mass_energy: f64) -> Result<QuarkContinuumSpectrum, ModelError> {
        Ok(QuarkContinuumSpectrum {
            rest_mass_energy: check_positive("rest-mass energy", rest_mass_energy)?,
        })
    }
}

impl DarkMatterSpectrum for QuarkContinuumSpectrum {
    fn rest_mass_energy(&self) -> f64 {
        self.rest_mass_energy
    }

    fn particles_per_energy(&self, e_gamma: f64) -> f64 {
        let x = e_gamma / self.rest_mass_energy;
        if !(x > 0.0 && x < 1.0) {
            return 0.0;
        }
        0.73 * (-7.8 * x).exp() / x.powf(1.5) / self.rest_mass_energy
    }
}
