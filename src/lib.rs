// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Line-of-sight integration of Galactic emission and propagation models into
//! HEALPix sky maps.
//!
//! An [`integrator::Integrator`] turns a model of the Galaxy into a value per
//! sky direction (dispersion measure, synchrotron brightness temperature,
//! gamma-ray flux, ...). A [`skymap::Skymap`] evaluates an integrator over
//! every unmasked HEALPix pixel on a pool of worker threads.

pub mod cache_table;
mod cli;
pub mod constants;
pub mod coord;
pub mod healpix;
pub mod integrator;
pub mod memo;
pub(crate) mod misc;
pub mod models;
pub mod quadrature;
pub mod scheduler;
pub mod skymap;
pub(crate) mod unit_parsing;

use crossbeam_utils::atomic::AtomicCell;

/// Should progress bars be drawn? Only the binary turns these on.
pub(crate) static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);

// Re-exports.
pub use cli::{Skylos, SkylosError};
pub use coord::{Direction, GalacticBoundary};
pub use integrator::{Integrator, IntegratorError, IntegratorKind};
pub use skymap::{Skymap, SkymapRange};
