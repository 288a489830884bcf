// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sky directions and galactocentric positions.
//!
//! Positions live in a right-handed galactocentric Cartesian frame \[metres\].
//! The default observer sits on the +x axis. Directions are heliocentric
//! Galactic angles in the HEALPix convention: `theta` is the co-latitude and
//! `phi` the Galactic longitude, so `phi = 0` on the Galactic plane points at
//! the Galactic centre.

mod error;

pub use error::CoordError;

use nalgebra::Vector3;

use crate::constants::*;

/// A position in the galactocentric frame \[metres\].
pub type Position = Vector3<f64>;

/// A direction on the sky. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    /// Co-latitude \[radians\], in \[0, π\].
    theta: f64,

    /// Longitude \[radians\], in \[0, 2π).
    phi: f64,
}

impl Direction {
    /// Make a new [`Direction`]. `phi` is wrapped into \[0, 2π); `theta` must
    /// already be within \[0, π\].
    pub fn new(theta: f64, phi: f64) -> Result<Direction, CoordError> {
        if !(0.0..=PI).contains(&theta) || !phi.is_finite() {
            return Err(CoordError::BadDirection { theta, phi });
        }
        let phi = phi.rem_euclid(TAU);
        // rem_euclid can round up to exactly 2π for tiny negative inputs.
        let phi = if phi >= TAU { 0.0 } else { phi };
        Ok(Direction { theta, phi })
    }

    /// For angles that are in range by construction (e.g. HEALPix pixel
    /// centres).
    pub(crate) fn new_unchecked(theta: f64, phi: f64) -> Direction {
        debug_assert!((0.0..=PI).contains(&theta));
        debug_assert!((0.0..TAU).contains(&phi));
        Direction { theta, phi }
    }

    /// Make a [`Direction`] from Galactic latitude `b` and longitude `l`
    /// \[radians\].
    pub fn from_galactic(b: f64, l: f64) -> Result<Direction, CoordError> {
        Direction::new(FRAC_PI_2 - b, l)
    }

    /// Make a [`Direction`] from Galactic latitude `b` and longitude `l`
    /// \[degrees\].
    pub fn from_galactic_degrees(b: f64, l: f64) -> Result<Direction, CoordError> {
        Direction::from_galactic(b.to_radians(), l.to_radians())
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Galactic latitude \[radians\].
    pub fn latitude(&self) -> f64 {
        FRAC_PI_2 - self.theta
    }

    /// Galactic longitude \[radians\].
    pub fn longitude(&self) -> f64 {
        self.phi
    }

    /// The unit vector pointing along this direction, expressed in the
    /// galactocentric frame.
    pub fn to_unit_vector(&self) -> Vector3<f64> {
        let (s_theta, c_theta) = self.theta.sin_cos();
        let (s_phi, c_phi) = self.phi.sin_cos();
        Vector3::new(-s_theta * c_phi, -s_theta * s_phi, c_theta)
    }

    /// The great-circle angle between two directions \[radians\].
    pub fn angle_to(&self, other: &Direction) -> f64 {
        let dot = self.to_unit_vector().dot(&other.to_unit_vector());
        dot.clamp(-1.0, 1.0).acos()
    }
}

/// The position `distance` metres away from `observer` along `direction`.
pub fn galactic_position(observer: &Position, distance: f64, direction: &Direction) -> Position {
    observer + direction.to_unit_vector() * distance
}

/// The region outside which all physical densities are taken to vanish. Line
/// of sight integrals stop at the sphere of radius `radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalacticBoundary {
    /// \[metres\]
    pub radius: f64,

    /// \[metres\]
    pub half_height: f64,
}

impl Default for GalacticBoundary {
    fn default() -> Self {
        GalacticBoundary {
            radius: DEFAULT_BOUNDARY_RADIUS,
            half_height: DEFAULT_BOUNDARY_HALF_HEIGHT,
        }
    }
}

impl GalacticBoundary {
    pub fn new(radius: f64, half_height: f64) -> Result<GalacticBoundary, CoordError> {
        if !(radius > 0.0 && radius.is_finite()) || !(half_height > 0.0 && half_height.is_finite())
        {
            return Err(CoordError::BadBoundary {
                radius,
                half_height,
            });
        }
        Ok(GalacticBoundary {
            radius,
            half_height,
        })
    }

    /// Distance from `observer` to the boundary sphere along `direction`
    /// (positive root of |o + d·u| = R). With the observer a distance D from
    /// the centre, looking straight at the centre gives R + D and looking
    /// straight away gives R - D.
    pub fn distance_to_border(
        &self,
        observer: &Position,
        direction: &Direction,
    ) -> Result<f64, CoordError> {
        let r_sq = self.radius * self.radius;
        let o_sq = observer.norm_squared();
        if o_sq > r_sq {
            return Err(CoordError::ObserverOutsideBoundary {
                distance: o_sq.sqrt(),
                radius: self.radius,
            });
        }
        let o_dot_u = observer.dot(&direction.to_unit_vector());
        // The discriminant is non-negative whenever the observer is inside.
        let disc = (o_dot_u * o_dot_u - o_sq + r_sq).max(0.0);
        Ok(-o_dot_u + disc.sqrt())
    }
}

/// The default observer position, 8.5 kpc from the Galactic centre on the x
/// axis.
pub fn default_observer() -> Position {
    Position::new(DEFAULT_OBSERVER_X, 0.0, 0.0)
}
