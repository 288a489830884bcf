// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Synchrotron emission attenuated by free-free absorption.

use std::sync::Arc;

use super::{
    check_parameter, intensity_to_temperature, FreeFreeIntegrator, Integrator, IntegratorError,
    IntegratorKind, IntegratorState, SynchrotronIntegrator,
};
use crate::{
    constants::*,
    coord::{galactic_position, Direction, GalacticBoundary, Position},
    models::{CosmicRayDensity, IonizedGasDensity, MagneticField},
    quadrature::{trapezoid_integration, QuadratureError},
};

/// Synchrotron brightness temperature seen through the ionized gas.
///
/// Emission and absorption are evaluated at the same points of one trapezoid
/// walk. The optical depth from the observer to each point is accumulated on
/// the way out, and the emission there is attenuated by `exp(-τ)`.
///
/// This is the depth between the point and the observer. Weighting by
/// `exp(τ(s) - τ_max)` instead (the depth behind the point) gives different
/// maps whenever the gas is not symmetric along the ray.
pub struct SynchroAbsorptionIntegrator {
    state: IntegratorState,
    steps: usize,
    synchrotron: SynchrotronIntegrator,
    free_free: FreeFreeIntegrator,
}

impl SynchroAbsorptionIntegrator {
    pub fn new(
        field: Arc<dyn MagneticField>,
        electrons: Arc<dyn CosmicRayDensity>,
        gas: Arc<dyn IonizedGasDensity>,
    ) -> SynchroAbsorptionIntegrator {
        SynchroAbsorptionIntegrator {
            state: IntegratorState::new(IntegratorKind::SynchroAbsorption),
            steps: 500,
            synchrotron: SynchrotronIntegrator::new(field, electrons),
            free_free: FreeFreeIntegrator::new(gas),
        }
    }

    /// Use `steps` trapezoids along each line of sight.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// The optical depth from the observer out to `distance` along
    /// `direction`.
    pub fn optical_depth(
        &self,
        direction: &Direction,
        distance: f64,
        freq: f64,
    ) -> Result<f64, IntegratorError> {
        let observer = self.state.observer();
        let line_of_sight = direction.to_unit_vector();
        Ok(trapezoid_integration(
            |d| {
                self.free_free
                    .absorption_coefficient(&(observer + line_of_sight * d), freq)
            },
            0.0,
            distance,
            self.steps,
        )?)
    }
}

impl Integrator for SynchroAbsorptionIntegrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::SynchroAbsorption
    }

    fn state(&self) -> &IntegratorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IntegratorState {
        &mut self.state
    }

    fn set_observer_position(&mut self, observer: Position) {
        self.state.set_observer(observer);
        self.synchrotron.set_observer_position(observer);
        self.free_free.set_observer_position(observer);
    }

    fn set_galactic_boundary(&mut self, boundary: GalacticBoundary) {
        self.state.set_boundary(boundary);
        self.synchrotron.set_galactic_boundary(boundary);
        self.free_free.set_galactic_boundary(boundary);
    }

    fn set_skymap_parameter(&mut self, parameter: f64) {
        self.state.set_skymap_parameter(parameter);
        self.synchrotron.set_skymap_parameter(parameter);
        self.free_free.set_skymap_parameter(parameter);
    }

    /// The attenuated emissivity at `pos`.
    fn per_point(
        &self,
        pos: &Position,
        direction: &Direction,
        freq: f64,
    ) -> Result<f64, IntegratorError> {
        let freq = check_parameter(self.kind(), freq)?;
        let distance = (pos - self.state.observer()).norm();
        let tau = self.optical_depth(direction, distance, freq)?;
        let emissivity = self
            .synchrotron
            .emissivity_along(pos, &direction.to_unit_vector(), freq)?;
        Ok(emissivity * (-tau).exp())
    }

    fn integrate_over_los_with(
        &self,
        direction: &Direction,
        freq: f64,
    ) -> Result<f64, IntegratorError> {
        let freq = check_parameter(self.kind(), freq)?;
        if self.steps == 0 {
            return Err(QuadratureError::ZeroSteps.into());
        }
        let max_distance = self.state.max_distance(direction)?;
        let observer = self.state.observer();
        let line_of_sight = direction.to_unit_vector();
        let step = max_distance / self.steps as f64;

        let mut tau = 0.0;
        let mut previous_kappa = 0.0;
        let mut total = 0.0;
        for i in 0..=self.steps {
            let d = i as f64 * step;
            let pos = galactic_position(&observer, d, direction);
            let kappa = self.free_free.absorption_coefficient(&pos, freq);
            if i > 0 {
                tau += 0.5 * (previous_kappa + kappa) * step;
            }
            previous_kappa = kappa;

            let emissivity = self.synchrotron.emissivity_along(&pos, &line_of_sight, freq)?;
            let weight = if i == 0 || i == self.steps { 0.5 } else { 1.0 };
            total += weight * emissivity * (-tau).exp();
        }
        total *= step;

        Ok(intensity_to_temperature(total / (4.0 * PI), freq))
    }
}
