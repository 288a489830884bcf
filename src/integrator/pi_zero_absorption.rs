// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pion-decay gamma rays attenuated by pair production on the cosmic
//! microwave background.

use std::{cell::Cell, sync::Arc};

use vec1::Vec1;

use super::{
    check_parameter, walk_los, Integrator, IntegratorError, IntegratorKind, IntegratorState,
    PiZeroIntegrator,
};
use crate::{
    constants::*,
    coord::{Direction, Position},
    memo::FunctionCache2,
    models::{
        blackbody_number_density, BreitWheeler, CosmicRayDensity, DifferentialCrossSection,
        NeutralGasDensity,
    },
    quadrature::{qag, QuadratureError, QuadratureRule},
};

/// Target photons outside this range contribute nothing measurable for a
/// CMB-like temperature \[eV\].
const TARGET_ENERGY_RANGE: (f64, f64) = (1e-5, 5e-3);

/// Gamma rays from neutral pion decay, seen through the CMB.
///
/// Photons above a few hundred TeV annihilate on the CMB into
/// electron-positron pairs. The CMB fills the Galaxy uniformly, so the
/// absorption coefficient `K(E_γ)` is the same everywhere and the emission
/// at distance `d` from the observer is attenuated by `exp(-K d)`. Below
/// the pair threshold `K` is exactly zero and the maps equal
/// [`PiZeroIntegrator`]'s.
///
/// The cached quantity is the unattenuated emissivity.
pub struct PiZeroAbsorptionIntegrator {
    state: IntegratorState,
    rule: QuadratureRule,
    pi_zero: PiZeroIntegrator,

    /// \[K\]
    cmb_temperature: f64,

    /// `K(E_γ, T)` \[m^-1\].
    absorption: FunctionCache2<Result<f64, QuadratureError>>,
}

impl PiZeroAbsorptionIntegrator {
    pub fn new(
        cosmic_rays: Vec1<Arc<dyn CosmicRayDensity>>,
        gas: Arc<dyn NeutralGasDensity>,
        cross_section: Arc<dyn DifferentialCrossSection>,
    ) -> PiZeroAbsorptionIntegrator {
        PiZeroAbsorptionIntegrator {
            state: IntegratorState::new(IntegratorKind::PiZeroAbsorption),
            rule: QuadratureRule::Simpson { steps: 500 },
            pi_zero: PiZeroIntegrator::new(cosmic_rays, gas, cross_section),
            cmb_temperature: CMB_TEMPERATURE,
            absorption: FunctionCache2::new(|e_gamma, temperature| {
                pair_absorption_coefficient(&BreitWheeler, e_gamma, temperature)
            }),
        }
    }

    pub fn with_rule(mut self, rule: QuadratureRule) -> Self {
        self.rule = rule;
        self
    }

    /// Absorb on a blackbody of `temperature` \[K\] instead of today's CMB.
    /// Zero turns absorption off.
    pub fn with_cmb_temperature(mut self, temperature: f64) -> Self {
        self.cmb_temperature = temperature;
        self
    }

    /// The absorption coefficient for photons of energy `e_gamma`
    /// \[m^-1\].
    pub fn absorption_coefficient(&self, e_gamma: f64) -> Result<f64, QuadratureError> {
        if self.cmb_temperature <= 0.0 {
            return Ok(0.0);
        }
        self.absorption.get_value(e_gamma, self.cmb_temperature)
    }

    /// The unattenuated emissivity at `pos`.
    pub fn emissivity(&self, pos: &Position, e_gamma: f64) -> f64 {
        self.pi_zero.emissivity(pos, e_gamma)
    }
}

/// `K = ∫ n(ε) σ̄(E_γ, ε) dε` over blackbody target photons \[m^-1\].
fn pair_absorption_coefficient(
    cross_section: &BreitWheeler,
    e_gamma: f64,
    temperature: f64,
) -> Result<f64, QuadratureError> {
    let threshold = ELECTRON_REST_ENERGY * ELECTRON_REST_ENERGY / e_gamma;
    let lower = (TARGET_ENERGY_RANGE.0 * EV).max(threshold);
    let upper = TARGET_ENERGY_RANGE.1 * EV;
    if lower >= upper {
        return Ok(0.0);
    }

    let failure: Cell<Option<QuadratureError>> = Cell::new(None);
    let total = qag(
        |e_photon| match cross_section.angle_averaged(e_gamma, e_photon) {
            Ok(sigma) => blackbody_number_density(e_photon, temperature) * sigma,
            Err(e) => {
                failure.set(Some(e));
                0.0
            }
        },
        lower,
        upper,
        1e-4,
        DEFAULT_QAG_LIMIT,
    );
    if let Some(e) = failure.get() {
        return Err(e);
    }
    total
}

impl Integrator for PiZeroAbsorptionIntegrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::PiZeroAbsorption
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

    /// The attenuated emissivity at `pos`.
    fn per_point(
        &self,
        pos: &Position,
        _: &Direction,
        e_gamma: f64,
    ) -> Result<f64, IntegratorError> {
        let e_gamma = check_parameter(self.kind(), e_gamma)?;
        let k = self.absorption_coefficient(e_gamma)?;
        let distance = (pos - self.state.observer()).norm();
        Ok(self.cached_or_direct(pos, e_gamma)? * (-k * distance).exp())
    }

    fn integrate_over_los_with(
        &self,
        direction: &Direction,
        e_gamma: f64,
    ) -> Result<f64, IntegratorError> {
        let e_gamma = check_parameter(self.kind(), e_gamma)?;
        let k = self.absorption_coefficient(e_gamma)?;
        let observer = self.state.observer();
        let total = walk_los(&self.state, &self.rule, direction, |pos| {
            let attenuation = (-k * (pos - observer).norm()).exp();
            Ok(self.cached_or_direct(pos, e_gamma)? * attenuation)
        })?;
        Ok(total / (4.0 * PI))
    }
}
