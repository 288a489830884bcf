// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Inverse-Compton scattering of interstellar photons by cosmic-ray
//! electrons.

use std::sync::Arc;

use super::{
    check_parameter, energy::integrate_over_energy_axis_indexed, walk_los, Integrator,
    IntegratorError, IntegratorKind, IntegratorState,
};
use crate::{
    constants::*,
    coord::{Direction, Position},
    memo::IndexedFunctionCache,
    models::{CosmicRayDensity, PhotonField, ThreeBodyCrossSection},
    quadrature::QuadratureRule,
};

/// Gamma rays from inverse-Compton scattering.
///
/// The per-point quantity is the emissivity
/// `∫ dE n(E) c ∫ dε σ(E, ε, E_γ) dn/dε` \[m^-3 s^-1 J^-1\] and can be cached.
/// The cross section doesn't depend on position, so its values on the
/// (electron, photon) energy grid are memoized for the current skymap
/// energy.
pub struct InverseComptonIntegrator {
    state: IntegratorState,
    rule: QuadratureRule,
    electrons: Arc<dyn CosmicRayDensity>,
    photons: Arc<dyn PhotonField>,
    cross_section: Arc<dyn ThreeBodyCrossSection>,

    /// Cross sections indexed by (electron energy, target photon energy), for
    /// photons of energy `kernel_energy`.
    kernel: IndexedFunctionCache<f64>,
    kernel_energy: f64,
}

impl InverseComptonIntegrator {
    pub fn new(
        electrons: Arc<dyn CosmicRayDensity>,
        photons: Arc<dyn PhotonField>,
        cross_section: Arc<dyn ThreeBodyCrossSection>,
    ) -> InverseComptonIntegrator {
        let electron_energies = electrons.energy_axis().energies().to_vec();
        let photon_energies = photons.energy_axis().energies().to_vec();
        let kernel_cross_section = Arc::clone(&cross_section);
        let kernel = IndexedFunctionCache::new(move |i_electron, i_photon, e_gamma| {
            kernel_cross_section.diff_cross_section(
                electron_energies[i_electron],
                photon_energies[i_photon],
                e_gamma,
            )
        });

        let state = IntegratorState::new(IntegratorKind::InverseCompton);
        let kernel_energy = state.skymap_parameter();
        InverseComptonIntegrator {
            state,
            rule: QuadratureRule::default_qag(),
            electrons,
            photons,
            cross_section,
            kernel,
            kernel_energy,
        }
    }

    pub fn with_rule(mut self, rule: QuadratureRule) -> Self {
        self.rule = rule;
        self
    }

    /// How many cross-section values are memoized.
    pub fn num_kernel_values(&self) -> usize {
        self.kernel.len()
    }

    fn kernel_value(
        &self,
        (i_electron, e_electron): (usize, f64),
        (i_photon, e_photon): (usize, f64),
        e_gamma: f64,
    ) -> f64 {
        if e_gamma == self.kernel_energy {
            self.kernel.get_value(i_electron, i_photon, e_gamma)
        } else {
            self.cross_section
                .diff_cross_section(e_electron, e_photon, e_gamma)
        }
    }

    /// `∫ σ(E, ε, E_γ) dn/dε dε` for the `i_electron`th electron energy,
    /// integrated in log photon energy.
    fn photon_integral(
        &self,
        pos: &Position,
        electron: (usize, f64),
        e_gamma: f64,
    ) -> f64 {
        let photon_energies = self.photons.energy_axis().energies();
        photon_energies
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let i_photon = i + 1;
                let e_photon = w[1];
                let energy_density = self.photons.energy_density(pos, i_photon);
                if energy_density == 0.0 {
                    return 0.0;
                }
                let sigma = self.kernel_value(electron, (i_photon, e_photon), e_gamma);
                // ε² dn/dε / ε² × ε d(ln ε)
                sigma * energy_density / e_photon * (w[1] / w[0]).ln()
            })
            .sum()
    }

    /// Emissivity at `pos` for photons of energy `e_gamma`, without the
    /// spatial cache.
    pub fn emissivity(&self, pos: &Position, e_gamma: f64) -> f64 {
        let axis = self.electrons.energy_axis();
        let start = axis.first_index_at_or_above(e_gamma);
        integrate_over_energy_axis_indexed(axis, start, |i_electron, e| {
            let density = self.electrons.density_per_energy(e, pos);
            if density == 0.0 {
                return 0.0;
            }
            density * C_LIGHT * self.photon_integral(pos, (i_electron, e), e_gamma)
        })
    }
}

impl Integrator for InverseComptonIntegrator {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::InverseCompton
    }

    fn state(&self) -> &IntegratorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IntegratorState {
        &mut self.state
    }

    /// Memoized cross sections belong to one photon energy; start afresh.
    fn set_skymap_parameter(&mut self, parameter: f64) {
        if parameter != self.kernel_energy {
            self.kernel.clear();
            self.kernel_energy = parameter;
        }
        self.state.set_skymap_parameter(parameter);
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
