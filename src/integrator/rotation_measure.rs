// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use nalgebra::Vector3;

use super::{walk_los, Integrator, IntegratorError, IntegratorKind, IntegratorState};
use crate::{
    constants::*,
    coord::{Direction, Position},
    models::{IonizedGasDensity, MagneticField},
    quadrature::QuadratureRule,
};

/// `e³ / (8π² ε₀ m_e² c³)` \[rad m^-2 per (T m^-2)\].
fn rm_constant() -> f64 {
    ELEMENTARY_CHARGE.powi(3)
        / (8.0 * PI * PI * EPSILON_0 * ELECTRON_MASS * ELECTRON_MASS * C_LIGHT.powi(3))
}

/// `RM = e³/(8π² ε₀ m_e² c³) ∫ n_e B∥ dl` \[rad m^-2\].
///
/// `B∥` is positive when the field points towards the observer.
pub struct RotationMeasureIntegrator {
    state: IntegratorState,
    rule: QuadratureRule,
    field: Arc<dyn MagneticField>,
    gas: Arc<dyn IonizedGasDensity>,
}

impl RotationMeasureIntegrator {
    pub fn new(
        field: Arc<dyn MagneticField>,
        gas: Arc<dyn IonizedGasDensity>,
    ) -> RotationMeasureIntegrator {
        RotationMeasureIntegrator {
            state: IntegratorState::new(IntegratorKind::RotationMeasure),
            rule: QuadratureRule::Simpson { steps: 300 },
            field,
            gas,
        }
    }

    pub fn with_rule(mut self, rule: QuadratureRule) -> Self {
        self.rule = rule;
        self
    }

    fn integrand(&self, pos: &Position, line_of_sight: &Vector3<f64>) -> f64 {
        let b = self.field.field(pos);
        if b == Vector3::zeros() {
            return 0.0;
        }
        let b_parallel = -b.dot(line_of_sight);
        rm_constant() * b_parallel * self.gas.density(pos)
    }
}

impl Integrator for RotationMeasureIntegrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::RotationMeasure
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
        direction: &Direction,
        _: f64,
    ) -> Result<f64, IntegratorError> {
        Ok(self.integrand(pos, &direction.to_unit_vector()))
    }

    fn integrate_over_los_with(
        &self,
        direction: &Direction,
        _: f64,
    ) -> Result<f64, IntegratorError> {
        let line_of_sight = direction.to_unit_vector();
        walk_los(&self.state, &self.rule, direction, |pos| {
            Ok(self.integrand(pos, &line_of_sight))
        })
    }
}
