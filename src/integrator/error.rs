// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use super::IntegratorKind;
use crate::{
    cache_table::CacheTableError,
    coord::CoordError,
    quadrature::QuadratureError,
    scheduler::{JobError, SchedulerError},
};

#[derive(Error, Debug)]
pub enum IntegratorError {
    #[error("The {0} integrator's cache table is set up but not initialised; call init_cache_table after setting the skymap parameter")]
    CacheNotInitialized(IntegratorKind),

    #[error("The {0} integrator has no per-point quantity that can be cached")]
    CacheUnsupported(IntegratorKind),

    #[error("Filling the cache table was cancelled")]
    CacheFillCancelled,

    #[error("{failures} of {cells} cache table cells could not be computed. The first failure was: {first}")]
    CacheFillFailed {
        failures: usize,
        cells: usize,
        first: Box<IntegratorError>,
    },

    #[error("The {kind} integrator needs a positive, finite skymap parameter, but got {value}")]
    BadParameter { kind: IntegratorKind, value: f64 },

    #[error("Worker thread '{0}' panicked")]
    WorkerPanicked(String),

    #[error(transparent)]
    Quadrature(#[from] QuadratureError),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    CacheTable(#[from] CacheTableError),
}

impl JobError for IntegratorError {
    /// Numerical trouble along one line of sight doesn't say anything about
    /// the others.
    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IntegratorError::Quadrature(
                QuadratureError::NoConvergence { .. } | QuadratureError::NonFinite { .. }
            )
        )
    }
}

impl From<SchedulerError<IntegratorError>> for IntegratorError {
    fn from(e: SchedulerError<IntegratorError>) -> Self {
        match e {
            SchedulerError::Job(e) => e,
            SchedulerError::WorkerPanicked(name) => IntegratorError::WorkerPanicked(name),
        }
    }
}
