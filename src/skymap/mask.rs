// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Masks select which pixels of a sky map are computed.

use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    constants::TAU,
    coord::{CoordError, Direction},
    healpix::{nside2npix, pix2ang_ring, HealpixError},
};

/// A region of the sky.
pub trait SkymapMask: Send + Sync {
    /// Should the pixel at `direction` be computed?
    fn is_allowed(&self, direction: &Direction) -> bool;

    fn description(&self) -> String;

    /// One flag per RING pixel; `true` pixels are computed.
    fn get_mask(&self, nside: u32) -> Result<Vec<bool>, HealpixError> {
        (0..nside2npix(nside))
            .into_par_iter()
            .map(|pixel| Ok(self.is_allowed(&pix2ang_ring(nside, pixel)?)))
            .collect()
    }
}

/// The whole sky.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMask;

impl SkymapMask for NoMask {
    fn is_allowed(&self, _: &Direction) -> bool {
        true
    }

    fn description(&self) -> String {
        "no mask".to_string()
    }
}

/// Is `angle` on the arc going anticlockwise from `start` to `end`? Equal
/// ends make a full circle.
fn is_angle_between(angle: f64, start: f64, end: f64) -> bool {
    let start = start.rem_euclid(TAU);
    let end = end.rem_euclid(TAU);
    if start == end {
        return true;
    }
    let angle = angle.rem_euclid(TAU);
    if start < end {
        (start..=end).contains(&angle)
    } else {
        angle >= start || angle <= end
    }
}

/// A window in Galactic latitude and longitude. The longitude range runs
/// eastwards (increasing `l`) from the first to the second longitude and may
/// wrap through `l = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectangularWindow {
    /// \[radians\]
    latitude: [f64; 2],
    /// \[radians\]
    longitude: [f64; 2],
}

impl RectangularWindow {
    /// Angles are in degrees. The latitudes may be given in either order.
    pub fn new(latitude: [f64; 2], longitude: [f64; 2]) -> Result<RectangularWindow, CoordError> {
        for (b, l) in latitude.into_iter().zip(longitude) {
            if !(-90.0..=90.0).contains(&b) || !l.is_finite() {
                return Err(CoordError::BadDirection {
                    theta: (90.0 - b).to_radians(),
                    phi: l.to_radians(),
                });
            }
        }
        let [b1, b2] = latitude.map(f64::to_radians);
        Ok(RectangularWindow {
            latitude: [b1.min(b2), b1.max(b2)],
            longitude: longitude.map(f64::to_radians),
        })
    }
}

impl SkymapMask for RectangularWindow {
    fn is_allowed(&self, direction: &Direction) -> bool {
        let b = direction.latitude();
        (self.latitude[0]..=self.latitude[1]).contains(&b)
            && is_angle_between(direction.longitude(), self.longitude[0], self.longitude[1])
    }

    fn description(&self) -> String {
        format!(
            "b in [{:.2}°, {:.2}°], l from {:.2}° to {:.2}°",
            self.latitude[0].to_degrees(),
            self.latitude[1].to_degrees(),
            self.longitude[0].to_degrees(),
            self.longitude[1].to_degrees()
        )
    }
}

/// Everything within an angular radius of a centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularWindow {
    centre: Direction,

    /// \[radians\]
    aperture: f64,
}

impl CircularWindow {
    pub fn new(centre: Direction, aperture: f64) -> CircularWindow {
        CircularWindow { centre, aperture }
    }

    /// A window centred on Galactic (`b`, `l`) with radius `aperture`, all in
    /// degrees.
    pub fn from_galactic_degrees(b: f64, l: f64, aperture: f64) -> Result<CircularWindow, CoordError> {
        Ok(CircularWindow::new(
            Direction::from_galactic_degrees(b, l)?,
            aperture.to_radians(),
        ))
    }
}

impl SkymapMask for CircularWindow {
    fn is_allowed(&self, direction: &Direction) -> bool {
        direction.angle_to(&self.centre) <= self.aperture
    }

    fn description(&self) -> String {
        format!(
            "within {:.2}° of (b = {:.2}°, l = {:.2}°)",
            self.aperture.to_degrees(),
            self.centre.latitude().to_degrees(),
            self.centre.longitude().to_degrees()
        )
    }
}

/// Everything another mask excludes.
#[derive(Clone)]
pub struct InvertMask(pub Arc<dyn SkymapMask>);

impl SkymapMask for InvertMask {
    fn is_allowed(&self, direction: &Direction) -> bool {
        !self.0.is_allowed(direction)
    }

    fn description(&self) -> String {
        format!("not ({})", self.0.description())
    }
}

/// Only what every mask in the list allows. An empty list allows
/// everything.
#[derive(Clone, Default)]
pub struct MaskList(Vec<Arc<dyn SkymapMask>>);

impl MaskList {
    pub fn new() -> MaskList {
        MaskList::default()
    }

    pub fn add_mask(&mut self, mask: Arc<dyn SkymapMask>) {
        self.0.push(mask);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SkymapMask for MaskList {
    fn is_allowed(&self, direction: &Direction) -> bool {
        self.0.iter().all(|m| m.is_allowed(direction))
    }

    fn description(&self) -> String {
        if self.0.is_empty() {
            return NoMask.description();
        }
        self.0
            .iter()
            .map(|m| format!("({})", m.description()))
            .collect::<Vec<_>>()
            .join(" and ")
    }
}
