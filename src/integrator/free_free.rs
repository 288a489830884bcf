// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Thermal bremsstrahlung from the warm ionized medium.

use std::sync::Arc;

use super::{
    check_parameter, intensity_to_temperature, walk_los, Integrator, IntegratorError,
    IntegratorKind, IntegratorState,
};
use crate::{
    constants::*,
    coord::{Direction, Position},
    models::IonizedGasDensity,
    quadrature::QuadratureRule,
};

/// The velocity-averaged Gaunt factor for a Maxwellian plasma at temperature
/// `temperature` \[K\], for ions of charge `z`.
pub fn gaunt_factor(freq: f64, temperature: f64, z: u32) -> f64 {
    let k = 128.0 * EPSILON_0 * EPSILON_0 * K_BOLTZMANN.powi(3)
        / (ELECTRON_MASS * ELEMENTARY_CHARGE.powi(4));
    let nu_z = freq * z as f64;
    3f64.sqrt() / (2.0 * PI) * ((k * temperature.powi(3) / (nu_z * nu_z)).ln() - EULER_GAMMA.sqrt())
}

/// Angle-integrated free-free emissivity \[W m^-3 Hz^-1\] of ions with
/// density `ion_density` and charge `z` and electrons with density
/// `electron_density`, both \[m^-3\].
pub fn spectral_emissivity(
    ion_density: f64,
    electron_density: f64,
    freq: f64,
    temperature: f64,
    z: u32,
) -> f64 {
    let k = 1.0 / (3.0 * PI * PI)
        * (PI / 6.0).sqrt()
        * ELEMENTARY_CHARGE.powi(6)
        / ((EPSILON_0 * C_LIGHT).powi(3) * ELECTRON_MASS * ELECTRON_MASS)
        * (ELECTRON_MASS / K_BOLTZMANN).sqrt();
    let z_f = z as f64;
    k * z_f
        * z_f
        * gaunt_factor(freq, temperature, z)
        * ion_density
        * electron_density
        / temperature.sqrt()
        * (-H_PLANCK * freq / (K_BOLTZMANN * temperature)).exp()
}

/// Planck's law \[W m^-2 Hz^-1 sr^-1\].
fn planck(freq: f64, temperature: f64) -> f64 {
    2.0 * H_PLANCK * freq.powi(3)
        / (C_LIGHT * C_LIGHT)
        / (H_PLANCK * freq / (K_BOLTZMANN * temperature)).exp_m1()
}

/// Free-free emission of a fully ionized hydrogen plasma, as a brightness
/// temperature.
pub struct FreeFreeIntegrator {
    state: IntegratorState,
    rule: QuadratureRule,
    gas: Arc<dyn IonizedGasDensity>,
}

impl FreeFreeIntegrator {
    pub fn new(gas: Arc<dyn IonizedGasDensity>) -> FreeFreeIntegrator {
        FreeFreeIntegrator {
            state: IntegratorState::new(IntegratorKind::FreeFree),
            rule: QuadratureRule::Simpson { steps: 300 },
            gas,
        }
    }

    pub fn with_rule(mut self, rule: QuadratureRule) -> Self {
        self.rule = rule;
        self
    }

    /// Emissivity at `pos` \[W m^-3 Hz^-1\]. Ions and electrons have the
    /// same density.
    pub fn emissivity(&self, pos: &Position, freq: f64) -> f64 {
        let n = self.gas.density(pos);
        if n == 0.0 {
            return 0.0;
        }
        spectral_emissivity(n, n, freq, self.gas.temperature(), 1)
    }

    /// Absorption coefficient at `pos` from Kirchhoff's law \[m^-1\].
    pub fn absorption_coefficient(&self, pos: &Position, freq: f64) -> f64 {
        let emissivity = self.emissivity(pos, freq);
        if emissivity == 0.0 {
            return 0.0;
        }
        emissivity / (4.0 * PI * planck(freq, self.gas.temperature()))
    }
}

impl Integrator for FreeFreeIntegrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::FreeFree
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
        freq: f64,
    ) -> Result<f64, IntegratorError> {
        let freq = check_parameter(self.kind(), freq)?;
        Ok(self.emissivity(pos, freq))
    }

    fn integrate_over_los_with(
        &self,
        direction: &Direction,
        freq: f64,
    ) -> Result<f64, IntegratorError> {
        let freq = check_parameter(self.kind(), freq)?;
        let total = walk_los(&self.state, &self.rule, direction, |pos| {
            Ok(self.emissivity(pos, freq))
        })?;
        Ok(intensity_to_temperature(total / (4.0 * PI), freq))
    }
}
