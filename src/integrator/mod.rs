// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Line-of-sight integrators.
//!
//! Every integrator walks the ray from the observer to the Galactic boundary,
//! evaluating a per-point integrand with a [`QuadratureRule`]. Integrators
//! whose per-point integrand is itself an expensive integral (synchrotron,
//! gamma rays) can precompute it on a [`CacheTable`] for the current skymap
//! parameter; the walk then interpolates the table instead.
//!
//! The cache follows a small state machine ([`IntegratorStatus`]):
//! `setup_cache_table` allocates a table, `init_cache_table` fills it for the
//! current skymap parameter, and changing the parameter (or the observer)
//! empties it again. Evaluating anything while a table is allocated but
//! empty is an error rather than a silently wrong answer.

mod bremsstrahlung;
mod dark_matter;
mod dispersion_measure;
mod energy;
mod error;
mod free_free;
mod inverse_compton;
mod pi_zero;
mod pi_zero_absorption;
mod rotation_measure;
mod state;
mod synchro_absorption;
mod synchrotron;
#[cfg(test)]
mod tests;

pub use bremsstrahlung::BremsstrahlungIntegrator;
pub use dark_matter::{DarkMatterIntegrator, DEFAULT_ANNIHILATION_CROSS_SECTION};
pub use dispersion_measure::DispersionMeasureIntegrator;
pub use error::IntegratorError;
pub use free_free::FreeFreeIntegrator;
pub use inverse_compton::InverseComptonIntegrator;
pub use pi_zero::PiZeroIntegrator;
pub use pi_zero_absorption::PiZeroAbsorptionIntegrator;
pub use rotation_measure::RotationMeasureIntegrator;
pub use state::IntegratorState;
pub use synchro_absorption::SynchroAbsorptionIntegrator;
pub use synchrotron::{synchrotron_kernel, SynchrotronIntegrator};

use std::cell::Cell;

use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    cache_table::CacheTable,
    constants::*,
    coord::{galactic_position, Direction, GalacticBoundary, Position},
    quadrature::QuadratureRule,
    scheduler::{self, CancelToken},
};

lazy_static::lazy_static! {
    pub(crate) static ref INTEGRATOR_KINDS_COMMA_SEPARATED: String = IntegratorKind::iter().join(", ");
}

/// The physical processes that can be integrated.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum IntegratorKind {
    #[strum(serialize = "dm")]
    #[serde(rename = "dm")]
    DispersionMeasure,

    #[strum(serialize = "rm")]
    #[serde(rename = "rm")]
    RotationMeasure,

    FreeFree,
    Synchrotron,
    SynchroAbsorption,
    PiZero,
    PiZeroAbsorption,
    InverseCompton,
    Bremsstrahlung,
    DarkMatter,
}

impl IntegratorKind {
    /// Radio maps are parameterised by frequency.
    pub fn is_radio(self) -> bool {
        matches!(
            self,
            IntegratorKind::FreeFree | IntegratorKind::Synchrotron | IntegratorKind::SynchroAbsorption
        )
    }

    /// Gamma-ray maps are parameterised by photon energy.
    pub fn is_gamma_ray(self) -> bool {
        matches!(
            self,
            IntegratorKind::PiZero
                | IntegratorKind::PiZeroAbsorption
                | IntegratorKind::InverseCompton
                | IntegratorKind::Bremsstrahlung
                | IntegratorKind::DarkMatter
        )
    }

    /// The skymap parameter used when none is given: 408 MHz for radio maps
    /// and 1 GeV for gamma rays. Measures ignore it.
    pub fn default_parameter(self) -> f64 {
        if self.is_radio() {
            DEFAULT_RADIO_FREQUENCY
        } else if self.is_gamma_ray() {
            DEFAULT_GAMMA_ENERGY
        } else {
            0.0
        }
    }

    /// SI units of a pixel.
    pub fn pixel_units(self) -> &'static str {
        match self {
            IntegratorKind::DispersionMeasure => "m^-2",
            IntegratorKind::RotationMeasure => "rad m^-2",
            IntegratorKind::FreeFree
            | IntegratorKind::Synchrotron
            | IntegratorKind::SynchroAbsorption => "K",
            IntegratorKind::PiZero
            | IntegratorKind::PiZeroAbsorption
            | IntegratorKind::InverseCompton
            | IntegratorKind::Bremsstrahlung
            | IntegratorKind::DarkMatter => "m^-2 s^-1 sr^-1 J^-1",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            IntegratorKind::DispersionMeasure => "Dispersion measure",
            IntegratorKind::RotationMeasure => "Faraday rotation measure",
            IntegratorKind::FreeFree => "Free-free brightness temperature",
            IntegratorKind::Synchrotron => "Synchrotron brightness temperature",
            IntegratorKind::SynchroAbsorption => {
                "Synchrotron brightness temperature with free-free absorption"
            }
            IntegratorKind::PiZero => "Gamma-ray intensity from neutral pion decay",
            IntegratorKind::PiZeroAbsorption => {
                "Gamma-ray intensity from neutral pion decay with pair absorption on the CMB"
            }
            IntegratorKind::InverseCompton => "Gamma-ray intensity from inverse-Compton scattering",
            IntegratorKind::Bremsstrahlung => "Gamma-ray intensity from electron bremsstrahlung",
            IntegratorKind::DarkMatter => "Gamma-ray intensity from dark-matter annihilation",
        }
    }
}

/// Where an integrator's cache is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorStatus {
    /// No cache table.
    Ready,

    /// A cache table exists but holds no values for the current skymap
    /// parameter.
    CacheSetup,

    /// The cache table holds values for the current skymap parameter.
    CacheInitialized,
}

/// The per-point integrand sampled along a line of sight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LosProfile {
    /// \[m\]
    pub distances: Vec<f64>,
    pub values: Vec<f64>,
}

/// A line-of-sight integrator.
///
/// Implementors supply their state, the per-point integrand and the full
/// integral; everything else is provided. Integrators are shared between
/// worker threads while a sky map is computed.
pub trait Integrator: Send + Sync {
    fn kind(&self) -> IntegratorKind;

    fn state(&self) -> &IntegratorState;

    fn state_mut(&mut self) -> &mut IntegratorState;

    /// The line-of-sight integral towards `direction` for the skymap
    /// parameter `parameter`, in the units of [`Integrator::pixel_units`].
    fn integrate_over_los_with(
        &self,
        direction: &Direction,
        parameter: f64,
    ) -> Result<f64, IntegratorError>;

    /// The quantity accumulated along the ray at `pos`, which lies along
    /// `direction` from the observer.
    fn per_point(
        &self,
        pos: &Position,
        direction: &Direction,
        parameter: f64,
    ) -> Result<f64, IntegratorError>;

    /// Can this integrator use a cache table?
    fn supports_cache(&self) -> bool {
        false
    }

    /// The position-dependent quantity a cache table stores, computed without
    /// the cache.
    fn direct_cached_quantity(
        &self,
        _pos: &Position,
        _parameter: f64,
    ) -> Result<f64, IntegratorError> {
        Err(IntegratorError::CacheUnsupported(self.kind()))
    }

    /// The cached quantity from the cache table if it was filled for
    /// `parameter`, otherwise computed directly.
    fn cached_or_direct(&self, pos: &Position, parameter: f64) -> Result<f64, IntegratorError> {
        match self.state().cache_lookup(pos, parameter)? {
            Some(v) => Ok(v),
            None => self.direct_cached_quantity(pos, parameter),
        }
    }

    /// The line-of-sight integral for the current skymap parameter.
    fn integrate_over_los(&self, direction: &Direction) -> Result<f64, IntegratorError> {
        self.integrate_over_los_with(direction, self.state().skymap_parameter())
    }

    /// Distance to the Galactic boundary along `direction` \[m\].
    fn get_max_distance(&self, direction: &Direction) -> Result<f64, IntegratorError> {
        self.state().max_distance(direction)
    }

    fn get_observer_position(&self) -> Position {
        self.state().observer()
    }

    /// Move the observer. A filled cache table is emptied.
    fn set_observer_position(&mut self, observer: Position) {
        self.state_mut().set_observer(observer)
    }

    fn get_galactic_boundary(&self) -> GalacticBoundary {
        self.state().boundary()
    }

    /// Only affects cache tables set up afterwards.
    fn set_galactic_boundary(&mut self, boundary: GalacticBoundary) {
        self.state_mut().set_boundary(boundary)
    }

    fn get_skymap_parameter(&self) -> f64 {
        self.state().skymap_parameter()
    }

    /// Set the frequency or energy of the map. A filled cache table is emptied
    /// if the value changes.
    fn set_skymap_parameter(&mut self, parameter: f64) {
        self.state_mut().set_skymap_parameter(parameter)
    }

    fn status(&self) -> IntegratorStatus {
        self.state().status()
    }

    /// Allocate a `nx` × `ny` × `nz` cache table spanning the default cache
    /// box. The table is filled by [`Integrator::init_cache_table`].
    fn setup_cache_table(&mut self, nx: usize, ny: usize, nz: usize) -> Result<(), IntegratorError> {
        if !self.supports_cache() {
            return Err(IntegratorError::CacheUnsupported(self.kind()));
        }
        let half_height = self.state().boundary().half_height;
        let table = CacheTable::symmetric(nx, ny, nz, DEFAULT_CACHE_HALF_EXTENT_XY, half_height)?;
        debug!(
            "{} cache table: {nx} x {ny} x {nz} cells, spacing {:.3} x {:.3} x {:.3} kpc",
            self.kind(),
            table.spacing().x / KPC,
            table.spacing().y / KPC,
            table.spacing().z / KPC
        );
        self.state_mut().install_cache(table);
        Ok(())
    }

    /// Fill the cache table for the current skymap parameter, using every
    /// available thread.
    fn init_cache_table(&mut self, cancel: &CancelToken) -> Result<(), IntegratorError> {
        self.init_cache_table_with_threads(scheduler::default_num_threads(), cancel)
    }

    /// Fill the cache table for the current skymap parameter. Does nothing if
    /// there is no table or it's already filled.
    fn init_cache_table_with_threads(
        &mut self,
        num_threads: usize,
        cancel: &CancelToken,
    ) -> Result<(), IntegratorError> {
        if self.status() != IntegratorStatus::CacheSetup {
            return Ok(());
        }
        let parameter = self.get_skymap_parameter();
        let positions: Vec<Position> = match self.state().cache_table() {
            Some(table) => table.positions().collect(),
            None => return Ok(()),
        };
        info!(
            "Filling the {} cache table ({} cells)",
            self.kind(),
            positions.len()
        );

        let mut values = vec![0.0; positions.len()];
        let progress = scheduler::progress_bar(positions.len(), "Cache table", "cells");
        let summary = {
            let this = &*self;
            scheduler::run_chunked(&positions, &mut values, num_threads, &progress, cancel, |pos| {
                this.direct_cached_quantity(pos, parameter)
            })?
        };
        progress.abandon_with_message("Cache table done");

        if summary.cancelled {
            return Err(IntegratorError::CacheFillCancelled);
        }
        let failures = summary.failures.len();
        if let Some(first) = summary.failures.into_iter().next() {
            return Err(IntegratorError::CacheFillFailed {
                failures,
                cells: positions.len(),
                first: Box::new(first.error),
            });
        }

        self.state_mut().fill_cache(&values, parameter);
        Ok(())
    }

    fn is_cache_table_enabled(&self) -> bool {
        self.status() != IntegratorStatus::Ready
    }

    fn is_cache_table_initialized(&self) -> bool {
        self.status() == IntegratorStatus::CacheInitialized
    }

    /// The per-point integrand at `steps + 1` evenly spaced distances from the
    /// observer to the boundary.
    fn los_profile(
        &self,
        direction: &Direction,
        parameter: f64,
        steps: usize,
    ) -> Result<LosProfile, IntegratorError> {
        let max_distance = self.get_max_distance(direction)?;
        let observer = self.get_observer_position();
        let steps = steps.max(1);
        let distances: Vec<f64> = (0..=steps)
            .map(|i| max_distance * i as f64 / steps as f64)
            .collect();
        let values = distances
            .iter()
            .map(|&d| {
                let pos = galactic_position(&observer, d, direction);
                self.per_point(&pos, direction, parameter)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LosProfile { distances, values })
    }

    fn pixel_units(&self) -> &'static str {
        self.kind().pixel_units()
    }

    fn description(&self) -> String {
        self.kind().description().to_string()
    }
}

/// Integrate `f` from the observer to the boundary along `direction`.
///
/// The first error from `f` stops further evaluations and is returned.
pub(crate) fn walk_los<F>(
    state: &IntegratorState,
    rule: &QuadratureRule,
    direction: &Direction,
    f: F,
) -> Result<f64, IntegratorError>
where
    F: Fn(&Position) -> Result<f64, IntegratorError>,
{
    let max_distance = state.max_distance(direction)?;
    let observer = state.observer();
    let failure: Cell<Option<IntegratorError>> = Cell::new(None);
    let total = rule.integrate(
        |d| {
            let previous = failure.take();
            if previous.is_some() {
                failure.set(previous);
                return 0.0;
            }
            match f(&galactic_position(&observer, d, direction)) {
                Ok(v) => v,
                Err(e) => {
                    failure.set(Some(e));
                    0.0
                }
            }
        },
        0.0,
        max_distance,
    );
    if let Some(e) = failure.into_inner() {
        return Err(e);
    }
    Ok(total?)
}

/// Radio and gamma-ray maps need a positive frequency or energy.
pub(crate) fn check_parameter(kind: IntegratorKind, parameter: f64) -> Result<f64, IntegratorError> {
    if parameter > 0.0 && parameter.is_finite() {
        Ok(parameter)
    } else {
        Err(IntegratorError::BadParameter {
            kind,
            value: parameter,
        })
    }
}

/// Rayleigh–Jeans brightness temperature of a specific intensity
/// \[W m^-2 Hz^-1 sr^-1\] at `freq` \[Hz\].
pub fn intensity_to_temperature(intensity: f64, freq: f64) -> f64 {
    intensity * C_LIGHT * C_LIGHT / (2.0 * freq * freq * K_BOLTZMANN)
}
