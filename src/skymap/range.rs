// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use log::info;
use serde::{Deserialize, Serialize};

use super::{ComputeSummary, Skymap, SkymapError, SkymapMask, SkymapOutput};
use crate::{integrator::Integrator, scheduler::CancelToken};

/// Maps at geometrically spaced frequencies or energies.
#[derive(Debug, Clone)]
pub struct SkymapRange {
    maps: Vec<Skymap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkymapRangeOutput {
    pub maps: Vec<SkymapOutput>,
}

impl SkymapRange {
    /// `steps` maps from `min` to `max` inclusive. A single step gives one map
    /// at `min`.
    pub fn new(nside: u32, min: f64, max: f64, steps: usize) -> Result<SkymapRange, SkymapError> {
        if !(min > 0.0 && min <= max && max.is_finite()) || steps == 0 {
            return Err(SkymapError::BadRange { min, max, steps });
        }
        let ratio = if steps > 1 {
            (max / min).powf(1.0 / (steps - 1) as f64)
        } else {
            1.0
        };
        let maps = (0..steps)
            .map(|i| {
                let parameter = if i + 1 == steps && steps > 1 {
                    max
                } else {
                    min * ratio.powi(i as i32)
                };
                Skymap::new(nside, parameter)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SkymapRange { maps })
    }

    pub fn with_mask(self, mask: &dyn SkymapMask) -> Result<SkymapRange, SkymapError> {
        let maps = self
            .maps
            .into_iter()
            .map(|m| m.with_mask(mask))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SkymapRange { maps })
    }

    pub fn parameters(&self) -> Vec<f64> {
        self.maps.iter().map(Skymap::parameter).collect()
    }

    pub fn maps(&self) -> &[Skymap] {
        &self.maps
    }

    /// Compute the maps in order of increasing parameter. The integrator's
    /// cache table is refilled for every map. Stops after the first map that
    /// was cancelled.
    pub fn compute_with_threads(
        &mut self,
        integrator: &mut dyn Integrator,
        num_threads: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<ComputeSummary>, SkymapError> {
        let num_maps = self.maps.len();
        let mut summaries = Vec::with_capacity(num_maps);
        for (i, map) in self.maps.iter_mut().enumerate() {
            info!("Skymap {}/{num_maps} (parameter {:e})", i + 1, map.parameter());
            let summary = map.compute_with_threads(integrator, num_threads, cancel)?;
            let cancelled = summary.cancelled;
            summaries.push(summary);
            if cancelled {
                break;
            }
        }
        Ok(summaries)
    }

    pub fn compute(
        &mut self,
        integrator: &mut dyn Integrator,
        cancel: &CancelToken,
    ) -> Result<Vec<ComputeSummary>, SkymapError> {
        self.compute_with_threads(integrator, crate::scheduler::default_num_threads(), cancel)
    }

    pub fn to_output(&self) -> SkymapRangeOutput {
        SkymapRangeOutput {
            maps: self.maps.iter().map(Skymap::to_output).collect(),
        }
    }
}
