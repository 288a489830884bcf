// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordError {
    #[error("Direction (theta = {theta} rad, phi = {phi} rad) is invalid; theta must be within [0, π] and phi must be finite")]
    BadDirection { theta: f64, phi: f64 },

    #[error("Galactic boundary radius ({radius} m) and half-height ({half_height} m) must both be positive and finite")]
    BadBoundary { radius: f64, half_height: f64 },

    #[error("The observer is {distance} m from the Galactic centre, outside the boundary radius ({radius} m)")]
    ObserverOutsideBoundary { distance: f64, radius: f64 },
}
