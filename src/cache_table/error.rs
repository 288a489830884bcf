// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheTableError {
    #[error("Cache table dimensions must all be at least 1; got {nx} x {ny} x {nz}")]
    ZeroDimension { nx: usize, ny: usize, nz: usize },

    #[error("Cache table spacing must be positive and finite; got ({x}, {y}, {z}) m")]
    NonPositiveSpacing { x: f64, y: f64, z: f64 },

    #[error("Cache table origin must be finite; got ({x}, {y}, {z}) m")]
    NonFiniteOrigin { x: f64, y: f64, z: f64 },
}
