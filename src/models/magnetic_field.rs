// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use nalgebra::Vector3;

use super::{check_positive, cylindrical, MagneticField, ModelError};
use crate::{constants::*, coord::Position};

/// The same field everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformField(pub Vector3<f64>);

impl MagneticField for UniformField {
    fn field(&self, _: &Position) -> Vector3<f64> {
        self.0
    }
}

/// An azimuthal disk field, clockwise when seen from the north Galactic pole,
/// with strength falling exponentially in radius and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToroidalField {
    /// Strength at the Sun's radius in the plane \[T\].
    local_strength: f64,

    /// \[m\]
    radial_scale: f64,

    /// \[m\]
    vertical_scale: f64,
}

impl Default for ToroidalField {
    fn default() -> Self {
        ToroidalField {
            local_strength: 6.0 * MICRO_GAUSS,
            radial_scale: 10.0 * KPC,
            vertical_scale: 1.5 * KPC,
        }
    }
}

impl ToroidalField {
    pub fn new(
        local_strength: f64,
        radial_scale: f64,
        vertical_scale: f64,
    ) -> Result<ToroidalField, ModelError> {
        Ok(ToroidalField {
            local_strength: check_positive("field strength", local_strength)?,
            radial_scale: check_positive("radial scale", radial_scale)?,
            vertical_scale: check_positive("vertical scale", vertical_scale)?,
        })
    }
}

impl MagneticField for ToroidalField {
    fn field(&self, pos: &Position) -> Vector3<f64> {
        let (r, z) = cylindrical(pos);
        if r == 0.0 {
            return Vector3::zeros();
        }
        let strength = self.local_strength
            * (-(r - DEFAULT_OBSERVER_X) / self.radial_scale - z.abs() / self.vertical_scale)
                .exp();
        // Clockwise: -φ̂.
        Vector3::new(pos.y / r, -pos.x / r, 0.0) * strength
    }
}
