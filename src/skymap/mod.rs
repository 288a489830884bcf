// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! HEALPix sky maps filled by an [`Integrator`].
//!
//! Pixels are stored in RING order. Masked pixels, and pixels whose line of
//! sight integral failed, hold [`UNSEEN`].

mod error;
mod mask;
mod range;
#[cfg(test)]
mod tests;

pub use error::SkymapError;
pub use mask::{CircularWindow, InvertMask, MaskList, NoMask, RectangularWindow, SkymapMask};
pub use range::{SkymapRange, SkymapRangeOutput};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    constants::UNSEEN,
    coord::Direction,
    healpix::{is_valid_nside, nside2npix, pix2ang_ring, HealpixError},
    integrator::{Integrator, IntegratorError},
    scheduler::{self, CancelToken},
};

/// What happened when a map was computed.
#[derive(Debug)]
pub struct ComputeSummary {
    /// Pixels that now hold a value.
    pub computed: usize,

    /// Pixels skipped because of the mask.
    pub masked: usize,

    /// Pixels whose integral failed without stopping the map.
    pub failures: Vec<(usize, IntegratorError)>,

    /// Did the computation stop early?
    pub cancelled: bool,
}

/// A flat, serialisable copy of a [`Skymap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkymapOutput {
    pub nside: u32,

    /// The frequency \[Hz\] or energy \[J\] of the map.
    pub parameter: f64,

    pub description: String,

    pub units: String,

    /// RING-ordered pixel values.
    pub pixels: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct Skymap {
    nside: u32,
    parameter: f64,
    pixels: Vec<f64>,
    /// `true` pixels are computed.
    mask: Vec<bool>,
    description: String,
    units: String,
}

impl Skymap {
    /// An unmasked map with every pixel [`UNSEEN`].
    pub fn new(nside: u32, parameter: f64) -> Result<Skymap, SkymapError> {
        if !is_valid_nside(nside) {
            return Err(HealpixError::InvalidNside(nside).into());
        }
        if !parameter.is_finite() {
            return Err(SkymapError::BadParameter(parameter));
        }
        let npix = nside2npix(nside);
        Ok(Skymap {
            nside,
            parameter,
            pixels: vec![UNSEEN; npix],
            mask: vec![true; npix],
            description: String::new(),
            units: String::new(),
        })
    }

    /// Restrict the map to what `mask` allows.
    pub fn with_mask(mut self, mask: &dyn SkymapMask) -> Result<Skymap, SkymapError> {
        self.mask = mask.get_mask(self.nside)?;
        debug!(
            "Skymap mask '{}' leaves {}/{} pixels",
            mask.description(),
            self.unmasked_pixel_count(),
            self.npix()
        );
        Ok(self)
    }

    pub fn nside(&self) -> u32 {
        self.nside
    }

    pub fn npix(&self) -> usize {
        self.pixels.len()
    }

    pub fn parameter(&self) -> f64 {
        self.parameter
    }

    pub fn pixels(&self) -> &[f64] {
        &self.pixels
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn unmasked_pixel_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Compute every unmasked pixel on all available threads.
    pub fn compute(
        &mut self,
        integrator: &mut dyn Integrator,
        cancel: &CancelToken,
    ) -> Result<ComputeSummary, SkymapError> {
        self.compute_with_threads(integrator, scheduler::default_num_threads(), cancel)
    }

    /// Set the integrator to this map's parameter, fill its cache table if it
    /// has one, then integrate along the line of sight of every unmasked
    /// pixel.
    pub fn compute_with_threads(
        &mut self,
        integrator: &mut dyn Integrator,
        num_threads: usize,
        cancel: &CancelToken,
    ) -> Result<ComputeSummary, SkymapError> {
        let masked = self.npix() - self.unmasked_pixel_count();
        self.pixels.fill(UNSEEN);
        self.description = integrator.description();
        self.units = integrator.pixel_units().to_string();

        integrator.set_skymap_parameter(self.parameter);
        if integrator.is_cache_table_enabled() {
            match integrator.init_cache_table_with_threads(num_threads, cancel) {
                Ok(()) => (),
                Err(IntegratorError::CacheFillCancelled) => {
                    return Ok(ComputeSummary {
                        computed: 0,
                        masked,
                        failures: vec![],
                        cancelled: true,
                    })
                }
                Err(e) => return Err(e.into()),
            }
        }

        let (indices, directions): (Vec<usize>, Vec<Direction>) = self
            .mask
            .iter()
            .enumerate()
            .filter(|&(_, &allowed)| allowed)
            .map(|(i, _)| Ok((i, pix2ang_ring(self.nside, i)?)))
            .collect::<Result<Vec<_>, HealpixError>>()?
            .into_iter()
            .unzip();

        info!(
            "Computing {} ({} of {} pixels, nside {})",
            self.description,
            directions.len(),
            self.npix(),
            self.nside
        );
        let mut values = vec![UNSEEN; directions.len()];
        let progress = scheduler::progress_bar(directions.len(), "Sky pixels", "pixels");
        let summary = {
            let integrator = &*integrator;
            scheduler::run_chunked(
                &directions,
                &mut values,
                num_threads,
                &progress,
                cancel,
                |direction| integrator.integrate_over_los(direction),
            )
            .map_err(IntegratorError::from)?
        };
        progress.abandon_with_message("Sky pixels done");

        for (&i, v) in indices.iter().zip(values) {
            self.pixels[i] = v;
        }

        let failures: Vec<(usize, IntegratorError)> = summary
            .failures
            .into_iter()
            .map(|f| (indices[f.job], f.error))
            .collect();
        for (pixel, e) in &failures {
            warn!("Pixel {pixel} was not computed: {e}");
        }
        if summary.cancelled {
            warn!(
                "Cancelled with {}/{} pixels computed",
                summary.completed,
                directions.len()
            );
        }

        Ok(ComputeSummary {
            computed: summary.completed,
            masked,
            failures,
            cancelled: summary.cancelled,
        })
    }

    /// The mean over pixels that hold a value.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .pixels
            .iter()
            .filter(|&&p| p != UNSEEN)
            .fold((0.0, 0usize), |(s, n), p| (s + p, n + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Multiply every computed pixel by `factor` and relabel the units.
    pub fn convert_to_units(&mut self, factor: f64, units: &str) {
        for p in self.pixels.iter_mut().filter(|p| **p != UNSEEN) {
            *p *= factor;
        }
        self.units = units.to_string();
    }

    pub fn to_output(&self) -> SkymapOutput {
        SkymapOutput {
            nside: self.nside,
            parameter: self.parameter,
            description: self.description.clone(),
            units: self.units.clone(),
            // UNSEEN is representable as an f32.
            pixels: self.pixels.iter().map(|&p| p as f32).collect(),
        }
    }
}
