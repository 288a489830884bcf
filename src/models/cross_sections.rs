// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Differential cross sections for gamma-ray production, and pair production
//! for gamma-ray absorption.

use std::sync::Arc;

use super::{DifferentialCrossSection, ThreeBodyCrossSection};
use crate::{
    constants::*,
    memo::{FunctionCache2, FunctionCache3},
    quadrature::{qag, QuadratureError},
};

/// Helium abundance relative to hydrogen, by number.
pub const HE_ABUNDANCE: f64 = 0.1;

/// Inverse-Compton scattering in the Klein–Nishina regime (Blumenthal & Gould
/// 1970, eq. 2.48). The projectile is an electron of total energy `e_proj`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KleinNishina;

impl ThreeBodyCrossSection for KleinNishina {
    fn diff_cross_section(&self, e_electron: f64, e_photon: f64, e_gamma: f64) -> f64 {
        if e_gamma >= e_electron || e_photon <= 0.0 || e_gamma <= 0.0 {
            return 0.0;
        }
        let lorentz = e_electron / ELECTRON_REST_ENERGY;
        let big_gamma = 4.0 * e_photon * lorentz / ELECTRON_REST_ENERGY;
        let q = e_gamma / (big_gamma * (e_electron - e_gamma));
        if !(1.0 / (4.0 * lorentz * lorentz)..=1.0).contains(&q) {
            return 0.0;
        }

        let gq = big_gamma * q;
        let f = 2.0 * q * q.ln() + (1.0 + 2.0 * q) * (1.0 - q) + gq * gq * (1.0 - q) / (2.0 * (1.0 + gq));
        3.0 * SIGMA_THOMSON / (4.0 * lorentz * lorentz * e_photon) * f
    }
}

/// Remembers every value of a three-body cross section it is asked for.
pub struct MemoizedThreeBody {
    cache: FunctionCache3<f64>,
}

impl MemoizedThreeBody {
    pub fn new(inner: Arc<dyn ThreeBodyCrossSection>) -> MemoizedThreeBody {
        MemoizedThreeBody {
            cache: FunctionCache3::new(move |a, b, c| inner.diff_cross_section(a, b, c)),
        }
    }

    /// How many values are stored.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl ThreeBodyCrossSection for MemoizedThreeBody {
    fn diff_cross_section(&self, e_proj: f64, e_target: f64, e_gamma: f64) -> f64 {
        self.cache.get_value(e_proj, e_target, e_gamma)
    }
}

/// Threshold total proton energy for pion production \[J\].
const PION_THRESHOLD: f64 = 1.22 * GEV;

/// Gamma rays from neutral pion decay in proton-proton collisions, after
/// Kelner, Aharonian & Bugayov (2006). The projectile energy is the total
/// proton energy. Values are memoized.
pub struct PionDecayCrossSection {
    cache: FunctionCache2<f64>,
}

impl Default for PionDecayCrossSection {
    fn default() -> Self {
        PionDecayCrossSection {
            cache: FunctionCache2::new(pion_decay_diff_cross_section),
        }
    }
}

impl PionDecayCrossSection {
    pub fn new() -> PionDecayCrossSection {
        PionDecayCrossSection::default()
    }

    pub fn num_cached(&self) -> usize {
        self.cache.len()
    }
}

impl DifferentialCrossSection for PionDecayCrossSection {
    fn diff_cross_section(&self, e_proton: f64, e_gamma: f64) -> f64 {
        self.cache.get_value(e_proton, e_gamma)
    }
}

/// Inelastic proton-proton cross section \[m^2\].
pub(crate) fn inelastic_pp_cross_section(e_proton: f64) -> f64 {
    if e_proton <= PION_THRESHOLD {
        return 0.0;
    }
    let l = (e_proton / TEV).ln();
    let threshold = 1.0 - (PION_THRESHOLD / e_proton).powi(4);
    // Millibarn to m^2.
    (34.3 + 1.88 * l + 0.25 * l * l) * threshold * threshold * 1e-31
}

pub(crate) fn pion_decay_diff_cross_section(e_proton: f64, e_gamma: f64) -> f64 {
    let x = e_gamma / e_proton;
    if !(x > 0.0 && x < 1.0) {
        return 0.0;
    }
    let sigma = inelastic_pp_cross_section(e_proton);
    if sigma == 0.0 {
        return 0.0;
    }

    let l = (e_proton / TEV).ln();
    let b = 1.30 + 0.14 * l + 0.011 * l * l;
    let beta = 1.0 / (1.79 + 0.11 * l + 0.008 * l * l);
    let k = 1.0 / (0.801 + 0.049 * l + 0.014 * l * l);
    let xb = x.powf(beta);
    let ln_x = x.ln();
    let denominator = 1.0 + k * xb * (1.0 - xb);
    let f = b * ln_x / x
        * ((1.0 - xb) / denominator).powi(4)
        * (1.0 / ln_x
            - 4.0 * beta * xb / (1.0 - xb)
            - 4.0 * k * beta * xb * (1.0 - 2.0 * xb) / denominator);

    (sigma * f / e_proton).max(0.0)
}

/// Targets for electron bremsstrahlung.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BremsstrahlungTarget {
    /// Neutral hydrogen.
    HI,
    /// Neutral helium.
    He,
}

impl BremsstrahlungTarget {
    /// Screening functions `(φ₁, φ₂)` in the strongly shielded limit.
    fn screening(self) -> (f64, f64) {
        match self {
            BremsstrahlungTarget::HI => (45.79, 44.46),
            BremsstrahlungTarget::He => (134.60, 131.40),
        }
    }
}

/// Electron bremsstrahlung on neutral gas in the strongly shielded limit
/// (Blumenthal & Gould 1970). [`DifferentialCrossSection::diff_cross_section`]
/// gives the cross section per hydrogen atom, with helium added at
/// [`HE_ABUNDANCE`]. Values are memoized.
pub struct BremsstrahlungCrossSection {
    cache: FunctionCache2<f64>,
}

impl Default for BremsstrahlungCrossSection {
    fn default() -> Self {
        BremsstrahlungCrossSection {
            cache: FunctionCache2::new(|e_electron, e_gamma| {
                bremsstrahlung_for_target(BremsstrahlungTarget::HI, e_electron, e_gamma)
                    + HE_ABUNDANCE
                        * bremsstrahlung_for_target(BremsstrahlungTarget::He, e_electron, e_gamma)
            }),
        }
    }
}

impl BremsstrahlungCrossSection {
    pub fn new() -> BremsstrahlungCrossSection {
        BremsstrahlungCrossSection::default()
    }

    pub fn for_target(&self, target: BremsstrahlungTarget, e_electron: f64, e_gamma: f64) -> f64 {
        bremsstrahlung_for_target(target, e_electron, e_gamma)
    }
}

impl DifferentialCrossSection for BremsstrahlungCrossSection {
    fn diff_cross_section(&self, e_electron: f64, e_gamma: f64) -> f64 {
        self.cache.get_value(e_electron, e_gamma)
    }
}

fn bremsstrahlung_for_target(target: BremsstrahlungTarget, e_electron: f64, e_gamma: f64) -> f64 {
    let e_final = e_electron - e_gamma;
    if e_gamma <= 0.0 || e_final <= ELECTRON_REST_ENERGY {
        return 0.0;
    }
    let (phi_1, phi_2) = target.screening();
    let ratio = e_final / e_electron;
    ALPHA_FINE * R_ELECTRON * R_ELECTRON / e_gamma
        * ((1.0 + ratio * ratio) * phi_1 - 2.0 / 3.0 * ratio * phi_2)
}

/// Photon-photon pair production, `γγ → e⁺e⁻` (Breit & Wheeler 1934).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BreitWheeler;

impl BreitWheeler {
    /// The cross section for a gamma ray of energy `e_gamma` hitting a photon
    /// of energy `e_photon` at an angle with cosine `cos_theta` \[m^2\].
    pub fn cross_section(&self, e_gamma: f64, e_photon: f64, cos_theta: f64) -> f64 {
        let s = e_gamma * e_photon * (1.0 - cos_theta)
            / (2.0 * ELECTRON_REST_ENERGY * ELECTRON_REST_ENERGY);
        if s <= 1.0 {
            return 0.0;
        }
        let beta = (1.0 - 1.0 / s).sqrt();
        let beta_2 = beta * beta;
        3.0 / 16.0
            * SIGMA_THOMSON
            * (1.0 - beta_2)
            * (2.0 * beta * (beta_2 - 2.0)
                + (3.0 - beta_2 * beta_2) * ((1.0 + beta) / (1.0 - beta)).ln())
    }

    /// The cross section weighted by the collision rate `(1 - cos θ)` and
    /// averaged over an isotropic photon field \[m^2\].
    pub fn angle_averaged(&self, e_gamma: f64, e_photon: f64) -> Result<f64, QuadratureError> {
        let chi = e_gamma * e_photon / (2.0 * ELECTRON_REST_ENERGY * ELECTRON_REST_ENERGY);
        // Even a head-on collision is below threshold.
        if chi <= 0.5 {
            return Ok(0.0);
        }
        let max_cos_theta = 1.0 - 1.0 / chi;
        let total = qag(
            |mu| (1.0 - mu) * self.cross_section(e_gamma, e_photon, mu),
            -1.0,
            max_cos_theta,
            1e-6,
            DEFAULT_QAG_LIMIT,
        )?;
        Ok(0.5 * total)
    }
}
