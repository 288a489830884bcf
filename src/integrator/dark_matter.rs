// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use super::{
    check_parameter, walk_los, Integrator, IntegratorError, IntegratorKind, IntegratorState,
};
use crate::{
    constants::*,
    coord::{Direction, Position},
    models::{DarkMatterProfile, DarkMatterSpectrum},
    quadrature::QuadratureRule,
};

/// A thermal relic's velocity-averaged annihilation cross section
/// \[m^3 s^-1\].
pub const DEFAULT_ANNIHILATION_CROSS_SECTION: f64 = 3e-26 * CM * CM * CM;

/// Gamma rays from dark-matter particles annihilating in the Galactic halo.
///
/// The emissivity is `½ ⟨σv⟩ (ρ / m_χ)² dN/dE_γ`; the half avoids counting
/// each pair of identical particles twice. The halo is smooth and the
/// integrand is cheap, so there is no cache.
pub struct DarkMatterIntegrator {
    state: IntegratorState,
    rule: QuadratureRule,
    profile: Arc<dyn DarkMatterProfile>,
    spectrum: Arc<dyn DarkMatterSpectrum>,

    /// `⟨σv⟩` \[m^3 s^-1\]
    annihilation_cross_section: f64,
}

impl DarkMatterIntegrator {
    pub fn new(
        profile: Arc<dyn DarkMatterProfile>,
        spectrum: Arc<dyn DarkMatterSpectrum>,
    ) -> DarkMatterIntegrator {
        DarkMatterIntegrator {
            state: IntegratorState::new(IntegratorKind::DarkMatter),
            rule: QuadratureRule::default_qag(),
            profile,
            spectrum,
            annihilation_cross_section: DEFAULT_ANNIHILATION_CROSS_SECTION,
        }
    }

    pub fn with_rule(mut self, rule: QuadratureRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_annihilation_cross_section(mut self, sigma_v: f64) -> Self {
        self.annihilation_cross_section = sigma_v;
        self
    }

    /// Photons emitted per unit volume, time and energy at `pos`
    /// \[m^-3 s^-1 J^-1\].
    pub fn emissivity(&self, pos: &Position, e_gamma: f64) -> f64 {
        let rest_mass = self.spectrum.rest_mass_energy() / (C_LIGHT * C_LIGHT);
        let n = self.profile.mass_density(pos.norm()) / rest_mass;
        0.5 * self.annihilation_cross_section * n * n * self.spectrum.particles_per_energy(e_gamma)
    }
}

impl Integrator for DarkMatterIntegrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::DarkMatter
    }

    fn state(&self) -> &IntegratorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IntegratorState {
        &mut self.state
    }

    fn per_point(
        &self,
        pos: &Position,
        _: &Direction,
        e_gamma: f64,
    ) -> Result<f64, IntegratorError> {
        let e_gamma = check_parameter(self.kind(), e_gamma)?;
        Ok(self.emissivity(pos, e_gamma))
    }

    fn integrate_over_los_with(
        &self,
        direction: &Direction,
        e_gamma: f64,
    ) -> Result<f64, IntegratorError> {
        let e_gamma = check_parameter(self.kind(), e_gamma)?;
        let total = walk_los(&self.state, &self.rule, direction, |pos| {
            Ok(self.emissivity(pos, e_gamma))
        })?;
        Ok(total / (4.0 * PI))
    }
}
