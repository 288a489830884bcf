// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all skylos-related errors. This should be the *only* error
//! enum that is publicly visible.

use thiserror::Error;

use super::{common::IntegratorArgsError, compute::ComputeArgsError};
use crate::{
    cache_table::CacheTableError,
    coord::CoordError,
    healpix::HealpixError,
    integrator::IntegratorError,
    models::ModelError,
    quadrature::QuadratureError,
    scheduler::SignalHandlerError,
    skymap::SkymapError,
    unit_parsing::UnitParseError,
};

/// The *only* publicly visible error from skylos.
#[derive(Error, Debug)]
pub enum SkylosError {
    /// A problem with the supplied arguments.
    #[error("{0}")]
    Args(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files must be TOML or JSON and use the same names as the long command-line flags.")]
    ArgFile(String),

    /// An error while integrating.
    #[error("{0}")]
    Integrator(String),

    /// Numerical trouble while integrating. Usually fixed by a different
    /// quadrature rule.
    #[error("{0}\n\nYou may be able to fix this with a different quadrature rule (--quadrature).")]
    Quadrature(String),

    /// An error related to HEALPix maps.
    #[error("{0}")]
    Skymap(String),

    /// The user stopped the run.
    #[error("Cancelled; pixels that weren't computed hold the UNSEEN value")]
    Cancelled,

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<IntegratorArgsError> for SkylosError {
    fn from(e: IntegratorArgsError) -> Self {
        match e {
            IntegratorArgsError::Units(e) => Self::from(e),
            IntegratorArgsError::Coord(e) => Self::from(e),
            IntegratorArgsError::Model(e) => Self::from(e),
            IntegratorArgsError::Integrator(e) => Self::from(e),
            _ => Self::Args(e.to_string()),
        }
    }
}

impl From<ComputeArgsError> for SkylosError {
    fn from(e: ComputeArgsError) -> Self {
        Self::Args(e.to_string())
    }
}

impl From<IntegratorError> for SkylosError {
    fn from(e: IntegratorError) -> Self {
        let s = e.to_string();
        match e {
            IntegratorError::Quadrature(e) => Self::from(e),
            IntegratorError::CacheTable(e) => Self::from(e),
            IntegratorError::Coord(e) => Self::from(e),
            IntegratorError::BadParameter { .. } => Self::Args(s),
            IntegratorError::CacheFillCancelled => Self::Cancelled,
            IntegratorError::CacheNotInitialized(_)
            | IntegratorError::CacheUnsupported(_)
            | IntegratorError::CacheFillFailed { .. }
            | IntegratorError::WorkerPanicked(_) => Self::Integrator(s),
        }
    }
}

impl From<SkymapError> for SkylosError {
    fn from(e: SkymapError) -> Self {
        let s = e.to_string();
        match e {
            SkymapError::Integrator(e) => Self::from(e),
            SkymapError::Healpix(e) => Self::from(e),
            SkymapError::BadRange { .. } | SkymapError::BadParameter(_) => Self::Args(s),
        }
    }
}

impl From<QuadratureError> for SkylosError {
    fn from(e: QuadratureError) -> Self {
        Self::Quadrature(e.to_string())
    }
}

impl From<HealpixError> for SkylosError {
    fn from(e: HealpixError) -> Self {
        Self::Skymap(e.to_string())
    }
}

impl From<CacheTableError> for SkylosError {
    fn from(e: CacheTableError) -> Self {
        Self::Args(e.to_string())
    }
}

impl From<CoordError> for SkylosError {
    fn from(e: CoordError) -> Self {
        Self::Args(e.to_string())
    }
}

impl From<ModelError> for SkylosError {
    fn from(e: ModelError) -> Self {
        Self::Args(e.to_string())
    }
}

impl From<UnitParseError> for SkylosError {
    fn from(e: UnitParseError) -> Self {
        Self::Args(e.to_string())
    }
}

impl From<SignalHandlerError> for SkylosError {
    fn from(e: SignalHandlerError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<serde_json::Error> for SkylosError {
    fn from(e: serde_json::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<std::io::Error> for SkylosError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
