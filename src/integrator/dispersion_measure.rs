// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use super::{walk_los, Integrator, IntegratorError, IntegratorKind, IntegratorState};
use crate::{
    coord::{Direction, Position},
    models::IonizedGasDensity,
    quadrature::QuadratureRule,
};

/// `DM = ∫ n_e dl` \[m^-2\].
pub struct DispersionMeasureIntegrator {
    state: IntegratorState,
    rule: QuadratureRule,
    gas: Arc<dyn IonizedGasDensity>,
}

impl DispersionMeasureIntegrator {
    pub fn new(gas: Arc<dyn IonizedGasDensity>) -> DispersionMeasureIntegrator {
        DispersionMeasureIntegrator {
            state: IntegratorState::new(IntegratorKind::DispersionMeasure),
            rule: QuadratureRule::Simpson { steps: 300 },
            gas,
        }
    }

    pub fn with_rule(mut self, rule: QuadratureRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn rule(&self) -> QuadratureRule {
        self.rule
    }
}

impl Integrator for DispersionMeasureIntegrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::DispersionMeasure
    }

    fn state(&self) -> &IntegratorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IntegratorState {
        &mut self.state
    }

    fn per_point(&self, pos: &Position, _: &Direction, _: f64) -> Result<f64, IntegratorError> {
        Ok(self.gas.density(pos))
    }

    fn integrate_over_los_with(
        &self,
        direction: &Direction,
        _: f64,
    ) -> Result<f64, IntegratorError> {
        walk_los(&self.state, &self.rule, direction, |pos| {
            Ok(self.gas.density(pos))
        })
    }
}
