// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The state every integrator carries.

use log::debug;
use nalgebra::Vector3;

use super::{IntegratorError, IntegratorKind, IntegratorStatus};
use crate::{
    cache_table::CacheTable,
    coord::{default_observer, Direction, GalacticBoundary, Position},
};

/// A cache table and the skymap parameter its values were computed for.
#[derive(Debug, Clone)]
struct SpatialCache {
    table: CacheTable,

    /// `None` until the table has been filled.
    parameter: Option<f64>,
}

/// The observer, the boundary, the skymap parameter and the optional spatial
/// cache of an integrator.
///
/// A cache table is only ever valid for one skymap parameter and one observer
/// position; changing either invalidates it.
#[derive(Debug, Clone)]
pub struct IntegratorState {
    kind: IntegratorKind,
    observer: Position,
    boundary: GalacticBoundary,
    skymap_parameter: f64,
    cache: Option<SpatialCache>,
}

impl IntegratorState {
    pub fn new(kind: IntegratorKind) -> IntegratorState {
        IntegratorState {
            kind,
            observer: default_observer(),
            boundary: GalacticBoundary::default(),
            skymap_parameter: kind.default_parameter(),
            cache: None,
        }
    }

    pub fn kind(&self) -> IntegratorKind {
        self.kind
    }

    pub fn observer(&self) -> Position {
        self.observer
    }

    pub fn set_observer(&mut self, observer: Position) {
        if observer != self.observer {
            self.observer = observer;
            self.invalidate_cache();
        }
    }

    pub fn boundary(&self) -> GalacticBoundary {
        self.boundary
    }

    pub fn set_boundary(&mut self, boundary: GalacticBoundary) {
        self.boundary = boundary;
    }

    pub fn skymap_parameter(&self) -> f64 {
        self.skymap_parameter
    }

    /// A different parameter makes any filled cache table stale.
    pub fn set_skymap_parameter(&mut self, parameter: f64) {
        if parameter != self.skymap_parameter {
            self.skymap_parameter = parameter;
            self.invalidate_cache();
        }
    }

    fn invalidate_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            if cache.parameter.take().is_some() {
                debug!("{} cache table invalidated", self.kind);
            }
        }
    }

    pub fn status(&self) -> IntegratorStatus {
        match &self.cache {
            None => IntegratorStatus::Ready,
            Some(SpatialCache {
                parameter: None, ..
            }) => IntegratorStatus::CacheSetup,
            Some(SpatialCache {
                parameter: Some(_),
                ..
            }) => IntegratorStatus::CacheInitialized,
        }
    }

    /// Distance from the observer to the boundary along `direction` \[m\].
    pub fn max_distance(&self, direction: &Direction) -> Result<f64, IntegratorError> {
        Ok(self.boundary.distance_to_border(&self.observer, direction)?)
    }

    /// The unit vector from the observer towards `pos`, if `pos` isn't the
    /// observer.
    pub fn line_of_sight_to(&self, pos: &Position) -> Option<Vector3<f64>> {
        (pos - self.observer).try_normalize(f64::MIN_POSITIVE)
    }

    pub(crate) fn install_cache(&mut self, table: CacheTable) {
        self.cache = Some(SpatialCache {
            table,
            parameter: None,
        });
    }

    pub(crate) fn cache_table(&self) -> Option<&CacheTable> {
        self.cache.as_ref().map(|c| &c.table)
    }

    /// Store freshly computed cell values for `parameter`.
    pub(crate) fn fill_cache(&mut self, values: &[f64], parameter: f64) {
        if let Some(cache) = self.cache.as_mut() {
            cache.table.values_mut().copy_from_slice(values);
            cache.parameter = Some(parameter);
        }
    }

    /// Look `pos` up in the cache table.
    ///
    /// Without a table this is `Ok(None)`, as it is when the table was filled
    /// for a different parameter. A table that was set up but never filled is
    /// an error.
    pub fn cache_lookup(
        &self,
        pos: &Position,
        parameter: f64,
    ) -> Result<Option<f64>, IntegratorError> {
        match &self.cache {
            None => Ok(None),
            Some(SpatialCache {
                parameter: None, ..
            }) => Err(IntegratorError::CacheNotInitialized(self.kind)),
            Some(SpatialCache {
                table,
                parameter: Some(p),
            }) => {
                if *p == parameter {
                    Ok(Some(table.interpolate(pos)))
                } else {
                    Ok(None)
                }
            }
        }
    }
}
