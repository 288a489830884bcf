// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use approx::{assert_abs_diff_eq, assert_relative_eq};

use super::*;
use crate::{
    constants::*,
    coord::{Direction, Position},
    integrator::{
        DispersionMeasureIntegrator, FreeFreeIntegrator, IntegratorKind, IntegratorState,
    },
    models::IonizedGasDensity,
    quadrature::QuadratureError,
};

struct ConstantGas(f64);

impl IonizedGasDensity for ConstantGas {
    fn density(&self, _: &Position) -> f64 {
        self.0
    }

    fn temperature(&self) -> f64 {
        8000.0
    }
}

fn dm() -> DispersionMeasureIntegrator {
    DispersionMeasureIntegrator::new(Arc::new(ConstantGas(1e4)))
}

/// Fails to integrate anything in the northern Galactic hemisphere.
struct NorthernFailure {
    state: IntegratorState,
    fatal: bool,
}

impl NorthernFailure {
    fn new(fatal: bool) -> NorthernFailure {
        NorthernFailure {
            state: IntegratorState::new(IntegratorKind::DispersionMeasure),
            fatal,
        }
    }
}

impl Integrator for NorthernFailure {
    fn kind(&self) -> IntegratorKind {
        IntegratorKind::DispersionMeasure
    }

    fn state(&self) -> &IntegratorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut IntegratorState {
        &mut self.state
    }

    fn per_point(&self, _: &Position, _: &Direction, _: f64) -> Result<f64, IntegratorError> {
        Ok(1.0)
    }

    fn integrate_over_los_with(&self, direction: &Direction, _: f64) -> Result<f64, IntegratorError> {
        if direction.latitude() <= 0.0 {
            Ok(1.0)
        } else if self.fatal {
            Err(IntegratorError::CacheNotInitialized(self.kind()))
        } else {
            Err(QuadratureError::NonFinite { x: 0.0 }.into())
        }
    }
}

#[test]
fn test_new_skymap_is_unseen() {
    let map = Skymap::new(2, 0.0).unwrap();
    assert_eq!(map.npix(), 48);
    assert_eq!(map.unmasked_pixel_count(), 48);
    assert!(map.pixels().iter().all(|&p| p == UNSEEN));
    assert_eq!(map.mean(), None);

    assert!(matches!(
        Skymap::new(3, 0.0),
        Err(SkymapError::Healpix(HealpixError::InvalidNside(3)))
    ));
    assert!(matches!(
        Skymap::new(2, f64::NAN),
        Err(SkymapError::BadParameter(_))
    ));
}

#[test]
fn test_dm_map_of_uniform_gas() {
    let mut integrator = dm();
    let mut map = Skymap::new(4, 0.0).unwrap();
    let summary = map
        .compute_with_threads(&mut integrator, 3, &CancelToken::new())
        .unwrap();
    assert_eq!(summary.computed, 192);
    assert_eq!(summary.masked, 0);
    assert!(summary.failures.is_empty());
    assert!(!summary.cancelled);

    let boundary = integrator.state().boundary();
    let observer = integrator.get_observer_position();
    for (i, &p) in map.pixels().iter().enumerate() {
        let direction = pix2ang_ring(4, i).unwrap();
        let d = boundary.distance_to_border(&observer, &direction).unwrap();
        assert_relative_eq!(p, 1e4 * d, max_relative = 1e-10);
    }
    assert_eq!(map.description(), IntegratorKind::DispersionMeasure.description());
    assert_eq!(map.units(), IntegratorKind::DispersionMeasure.pixel_units());
}

#[test]
fn test_thread_count_does_not_change_the_map() {
    let mut integrator = dm();
    let mut one = Skymap::new(2, 0.0).unwrap();
    one.compute_with_threads(&mut integrator, 1, &CancelToken::new())
        .unwrap();
    let mut many = Skymap::new(2, 0.0).unwrap();
    many.compute_with_threads(&mut integrator, 13, &CancelToken::new())
        .unwrap();
    assert_eq!(one.pixels(), many.pixels());
}

#[test]
fn test_masked_pixels_stay_unseen() {
    let mut integrator = dm();
    let window = RectangularWindow::new([-30.0, 30.0], [300.0, 60.0]).unwrap();
    let mut map = Skymap::new(4, 0.0).unwrap().with_mask(&window).unwrap();
    let unmasked = map.unmasked_pixel_count();
    assert!(unmasked > 0 && unmasked < map.npix());

    let summary = map
        .compute_with_threads(&mut integrator, 4, &CancelToken::new())
        .unwrap();
    assert_eq!(summary.computed, unmasked);
    assert_eq!(summary.masked, map.npix() - unmasked);
    for (&p, &allowed) in map.pixels().iter().zip(map.mask()) {
        assert_eq!(p != UNSEEN, allowed);
    }
}

#[test]
fn test_compute_sets_the_skymap_parameter() {
    let mut integrator = FreeFreeIntegrator::new(Arc::new(ConstantGas(1e4)));
    let mut map = Skymap::new(1, 1.4 * GHZ).unwrap();
    map.compute_with_threads(&mut integrator, 2, &CancelToken::new())
        .unwrap();
    assert_abs_diff_eq!(integrator.get_skymap_parameter(), 1.4 * GHZ);
    assert!(map.pixels().iter().all(|&p| p > 0.0));
}

#[test]
fn test_recoverable_failures_are_reported_per_pixel() {
    let mut integrator = NorthernFailure::new(false);
    let mut map = Skymap::new(2, 0.0).unwrap();
    let summary = map
        .compute_with_threads(&mut integrator, 4, &CancelToken::new())
        .unwrap();
    assert_eq!(summary.computed + summary.failures.len(), 48);
    assert!(!summary.failures.is_empty());
    for (pixel, e) in &summary.failures {
        assert!(pix2ang_ring(2, *pixel).unwrap().latitude() > 0.0);
        assert!(matches!(e, IntegratorError::Quadrature(_)));
        assert_eq!(map.pixels()[*pixel], UNSEEN);
    }
    // Only computed pixels count towards the mean.
    assert_abs_diff_eq!(map.mean().unwrap(), 1.0);
}

#[test]
fn test_fatal_failure_stops_the_map() {
    let mut integrator = NorthernFailure::new(true);
    let mut map = Skymap::new(2, 0.0).unwrap();
    let result = map.compute_with_threads(&mut integrator, 4, &CancelToken::new());
    assert!(matches!(
        result,
        Err(SkymapError::Integrator(IntegratorError::CacheNotInitialized(_)))
    ));
}

#[test]
fn test_cancelled_map_is_unseen() {
    let mut integrator = dm();
    let mut map = Skymap::new(2, 0.0).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let summary = map.compute_with_threads(&mut integrator, 2, &cancel).unwrap();
    assert!(summary.cancelled);
    assert_eq!(summary.computed, 0);
    assert!(map.pixels().iter().all(|&p| p == UNSEEN));
}

#[test]
fn test_unit_conversion_and_output() {
    let mut integrator = dm();
    let window = CircularWindow::from_galactic_degrees(0.0, 0.0, 60.0).unwrap();
    let mut map = Skymap::new(2, 0.0).unwrap().with_mask(&window).unwrap();
    map.compute_with_threads(&mut integrator, 2, &CancelToken::new())
        .unwrap();
    let before = map.pixels().to_vec();
    map.convert_to_units(1.0 / (PC / (CM * CM * CM)), "pc cm^-3");
    assert_eq!(map.units(), "pc cm^-3");
    for (&b, &a) in before.iter().zip(map.pixels()) {
        if b == UNSEEN {
            assert_eq!(a, UNSEEN);
        } else {
            assert_relative_eq!(a, b * CM * CM * CM / PC, max_relative = 1e-12);
        }
    }

    let output = map.to_output();
    assert_eq!(output.nside, 2);
    assert_eq!(output.units, "pc cm^-3");
    assert_eq!(output.pixels.len(), 48);
    assert!(output.pixels.contains(&(UNSEEN as f32)));
    let json = serde_json::to_string(&output).unwrap();
    let back: SkymapOutput = serde_json::from_str(&json).unwrap();
    assert_eq!(back, output);
}

#[test]
fn test_rectangular_window_wraps_in_longitude() {
    let window = RectangularWindow::new([10.0, -10.0], [350.0, 10.0]).unwrap();
    for (b, l, allowed) in [
        (0.0, 0.0, true),
        (5.0, 355.0, true),
        (-5.0, 5.0, true),
        (0.0, 180.0, false),
        (20.0, 0.0, false),
        (0.0, 340.0, false),
    ] {
        let d = Direction::from_galactic_degrees(b, l).unwrap();
        assert_eq!(window.is_allowed(&d), allowed, "b = {b}, l = {l}");
    }

    // Equal longitudes mean all longitudes.
    let band = RectangularWindow::new([-10.0, 10.0], [0.0, 360.0]).unwrap();
    let d = Direction::from_galactic_degrees(0.0, 123.0).unwrap();
    assert!(band.is_allowed(&d));

    assert!(RectangularWindow::new([-95.0, 10.0], [0.0, 10.0]).is_err());
    assert!(RectangularWindow::new([-5.0, 10.0], [f64::NAN, 10.0]).is_err());
}

#[test]
fn test_circular_window() {
    let window = CircularWindow::from_galactic_degrees(0.0, 90.0, 10.0).unwrap();
    assert!(window.is_allowed(&Direction::from_galactic_degrees(5.0, 92.0).unwrap()));
    assert!(!window.is_allowed(&Direction::from_galactic_degrees(0.0, 105.0).unwrap()));
}

#[test]
fn test_inverted_and_combined_masks() {
    let nside = 4;
    let window: Arc<dyn SkymapMask> =
        Arc::new(CircularWindow::from_galactic_degrees(30.0, 0.0, 40.0).unwrap());
    let inside = window.get_mask(nside).unwrap();
    let outside = InvertMask(window.clone()).get_mask(nside).unwrap();
    for (a, b) in inside.iter().zip(&outside) {
        assert_ne!(a, b);
    }

    let disk: Arc<dyn SkymapMask> =
        Arc::new(RectangularWindow::new([-20.0, 20.0], [0.0, 0.0]).unwrap());
    let mut list = MaskList::new();
    assert!(list.get_mask(nside).unwrap().iter().all(|&m| m));
    list.add_mask(window);
    list.add_mask(disk.clone());
    assert_eq!(list.len(), 2);
    let both = list.get_mask(nside).unwrap();
    let disk = disk.get_mask(nside).unwrap();
    for i in 0..nside2npix(nside) {
        assert_eq!(both[i], inside[i] && disk[i]);
    }
    assert!(both.iter().any(|&m| m));
}

#[test]
fn test_range_parameters() {
    let range = SkymapRange::new(1, 1e6, 1e8, 3).unwrap();
    let p = range.parameters();
    assert_eq!(p.len(), 3);
    assert_relative_eq!(p[0], 1e6);
    assert_relative_eq!(p[1], 1e7, max_relative = 1e-12);
    assert_eq!(p[2], 1e8);

    let single = SkymapRange::new(1, 5.0, 5.0, 1).unwrap();
    assert_eq!(single.parameters(), vec![5.0]);

    for (min, max, steps) in [(0.0, 1.0, 3), (2.0, 1.0, 3), (1.0, 2.0, 0)] {
        assert!(matches!(
            SkymapRange::new(1, min, max, steps),
            Err(SkymapError::BadRange { .. })
        ));
    }
}

#[test]
fn test_range_computes_every_map() {
    let mut integrator = FreeFreeIntegrator::new(Arc::new(ConstantGas(1e5)));
    let window = CircularWindow::from_galactic_degrees(0.0, 0.0, 45.0).unwrap();
    let mut range = SkymapRange::new(1, 100.0 * MHZ, 10.0 * GHZ, 3)
        .unwrap()
        .with_mask(&window)
        .unwrap();
    let summaries = range
        .compute_with_threads(&mut integrator, 2, &CancelToken::new())
        .unwrap();
    assert_eq!(summaries.len(), 3);
    let means: Vec<f64> = range.maps().iter().map(|m| m.mean().unwrap()).collect();
    // Optically thin free-free brightness temperature falls with frequency.
    assert!(means[0] > means[1] && means[1] > means[2]);
    assert_eq!(range.to_output().maps.len(), 3);
}
