// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Synchrotron emission of cosmic-ray electrons.

use std::sync::Arc;

use nalgebra::Vector3;

use super::{
    check_parameter, energy::integrate_over_energy_axis, intensity_to_temperature, walk_los,
    Integrator, IntegratorError, IntegratorKind, IntegratorState,
};
use crate::{
    constants::*,
    coord::{Direction, Position},
    models::{CosmicRayDensity, MagneticField},
    quadrature::QuadratureRule,
};

/// The first synchrotron function `F(x) = x ∫ₓ^∞ K_{5/3}(t) dt`, from the
/// fit of Aharonian, Kelner & Prosekin (2010). Good to better than 0.2 %.
pub fn synchrotron_kernel(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let x_13 = x.cbrt();
    let x_23 = x_13 * x_13;
    let x_43 = x_23 * x_23;
    2.15 * x_13 * (1.0 + 3.06 * x).powf(1.0 / 6.0) * (1.0 + 0.884 * x_23 + 0.471 * x_43)
        / (1.0 + 1.64 * x_23 + 0.974 * x_43)
        * (-x).exp()
}

/// The magnitude of the component of `b` perpendicular to the unit vector
/// `line_of_sight`.
fn perpendicular_component(b: &Vector3<f64>, line_of_sight: &Vector3<f64>) -> f64 {
    (b - line_of_sight * b.dot(line_of_sight)).norm()
}

/// Synchrotron brightness temperature.
///
/// The per-point quantity is the angle-integrated emissivity
/// `j(ν) = ∫ n(E) P(ν, E) dE` \[W m^-3 Hz^-1\], which depends on the field
/// perpendicular to the line of sight and can be cached.
pub struct SynchrotronIntegrator {
    state: IntegratorState,
    rule: QuadratureRule,
    field: Arc<dyn MagneticField>,
    electrons: Arc<dyn CosmicRayDensity>,
}

impl SynchrotronIntegrator {
    pub fn new(
        field: Arc<dyn MagneticField>,
        electrons: Arc<dyn CosmicRayDensity>,
    ) -> SynchrotronIntegrator {
        SynchrotronIntegrator {
            state: IntegratorState::new(IntegratorKind::Synchrotron),
            rule: QuadratureRule::Simpson { steps: 500 },
            field,
            electrons,
        }
    }

    pub fn with_rule(mut self, rule: QuadratureRule) -> Self {
        self.rule = rule;
        self
    }

    /// Power per unit frequency radiated by one electron of energy `energy`
    /// in a field `b_perp` perpendicular to the line of sight \[W Hz^-1\].
    pub fn single_electron_emission(freq: f64, energy: f64, b_perp: f64) -> f64 {
        if b_perp == 0.0 {
            return 0.0;
        }
        let prefactor = 3f64.sqrt() * ELEMENTARY_CHARGE.powi(3)
            / (8.0 * PI * PI * EPSILON_0 * C_LIGHT * ELECTRON_MASS);
        let lorentz = energy / ELECTRON_REST_ENERGY;
        let critical_freq =
            3.0 * ELEMENTARY_CHARGE * b_perp * lorentz * lorentz / (4.0 * PI * ELECTRON_MASS);
        prefactor * b_perp * synchrotron_kernel(freq / critical_freq)
    }

    /// Emissivity at `pos` for a line of sight along the unit vector
    /// `line_of_sight`.
    pub fn emissivity(&self, pos: &Position, line_of_sight: &Vector3<f64>, freq: f64) -> f64 {
        let b_perp = perpendicular_component(&self.field.field(pos), line_of_sight);
        if b_perp == 0.0 {
            return 0.0;
        }
        integrate_over_energy_axis(self.electrons.energy_axis(), 0, |e| {
            self.electrons.density_per_energy(e, pos)
                * Self::single_electron_emission(freq, e, b_perp)
        })
    }

    /// The emissivity at `pos`, from the cache table if possible.
    pub(crate) fn emissivity_along(
        &self,
        pos: &Position,
        line_of_sight: &Vector3<f64>,
        freq: f64,
    ) -> Result<f64, IntegratorError> {
        match self.state.cache_lookup(pos, freq)? {
            Some(v) => Ok(v),
            None => Ok(self.emissivity(pos, line_of_sight, freq)),
        }
    }
}

impl Integrator for SynchrotronIntegrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::Synchrotron
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

    fn direct_cached_quantity(&self, pos: &Position, freq: f64) -> Result<f64, IntegratorError> {
        let freq = check_parameter(self.kind(), freq)?;
        // At the observer there is no line of sight; the whole field counts.
        let line_of_sight = self
            .state
            .line_of_sight_to(pos)
            .unwrap_or_else(Vector3::zeros);
        Ok(self.emissivity(pos, &line_of_sight, freq))
    }

    fn per_point(
        &self,
        pos: &Position,
        direction: &Direction,
        freq: f64,
    ) -> Result<f64, IntegratorError> {
        let freq = check_parameter(self.kind(), freq)?;
        self.emissivity_along(pos, &direction.to_unit_vector(), freq)
    }

    fn integrate_over_los_with(
        &self,
        direction: &Direction,
        freq: f64,
    ) -> Result<f64, IntegratorError> {
        let freq = check_parameter(self.kind(), freq)?;
        let line_of_sight = direction.to_unit_vector();
        let total = walk_los(&self.state, &self.rule, direction, |pos| {
            self.emissivity_along(pos, &line_of_sight, freq)
        })?;
        Ok(intensity_to_temperature(total / (4.0 * PI), freq))
    }
}
