// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use super::{
    check_parameter, energy::two_body_emissivity, walk_los, Integrator, IntegratorError,
    IntegratorKind, IntegratorState,
};
use crate::{
    constants::*,
    coord::{Direction, Position},
    models::{CosmicRayDensity, DifferentialCrossSection, NeutralGasDensity},
    quadrature::QuadratureRule,
};

/// Gamma rays from cosmic-ray electrons braking on neutral gas. The cross
/// section is per hydrogen atom, with any helium folded in.
pub struct BremsstrahlungIntegrator {
    state: IntegratorState,
    rule: QuadratureRule,
    electrons: [Arc<dyn CosmicRayDensity>; 1],
    gas: Arc<dyn NeutralGasDensity>,
    cross_section: Arc<dyn DifferentialCrossSection>,
}

impl BremsstrahlungIntegrator {
    pub fn new(
        electrons: Arc<dyn CosmicRayDensity>,
        gas: Arc<dyn NeutralGasDensity>,
        cross_section: Arc<dyn DifferentialCrossSection>,
    ) -> BremsstrahlungIntegrator {
        BremsstrahlungIntegrator {
            state: IntegratorState::new(IntegratorKind::Bremsstrahlung),
            rule: QuadratureRule::Simpson { steps: 500 },
            electrons: [electrons],
            gas,
            cross_section,
        }
    }

    pub fn with_rule(mut self, rule: QuadratureRule) -> Self {
        self.rule = rule;
        self
    }

    /// Emissivity at `pos` \[m^-3 s^-1 J^-1\], without the cache.
    pub fn emissivity(&self, pos: &Position, e_gamma: f64) -> f64 {
        let n_gas = self.gas.density(pos);
        if n_gas == 0.0 {
            return 0.0;
        }
        n_gas * two_body_emissivity(&self.electrons, self.cross_section.as_ref(), pos, e_gamma)
    }
}

impl Integrator for BremsstrahlungIntegrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::Bremsstrahlung
    }

    fn state(&self) -> &IntegratorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IntegratorState {
        &mut self.state
    }

    fn supports_cache(&self) -> bool {
        true
    }

    fn direct_cached_quantity(&self, pos: &Position, e_gamma: f64) -> Result<f64, IntegratorError> {
        let e_gamma = check_parameter(self.kind(), e_gamma)?;
        Ok(self.emissivity(pos, e_gamma))
    }

    fn per_point(
        &self,
        pos: &Position,
        _: &Direction,
        e_gamma: f64,
    ) -> Result<f64, IntegratorError> {
        self.cached_or_direct(pos, e_gamma)
    }

    fn integrate_over_los_with(
        &self,
        direction: &Direction,
        e_gamma: f64,
    ) -> Result<f64, IntegratorError> {
        let e_gamma = check_parameter(self.kind(), e_gamma)?;
        let total = walk_los(&self.state, &self.rule, direction, |pos| {
            self.cached_or_direct(pos, e_gamma)
        })?;
        Ok(total / (4.0 * PI))
    }
}
