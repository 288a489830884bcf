// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;

#[test]
fn test_nside2npix() {
    assert_eq!(nside2npix(1), 12);
    assert_eq!(nside2npix(2), 48);
    assert_eq!(nside2npix(64), 49152);
}

#[test]
fn test_valid_nside() {
    for nside in [1, 2, 4, 1024, MAX_NSIDE] {
        assert!(is_valid_nside(nside));
    }
    for nside in [0, 3, 12, 2 * MAX_NSIDE] {
        assert!(!is_valid_nside(nside));
    }
    assert!(matches!(
        pix2ang_ring(3, 0),
        Err(HealpixError::InvalidNside(3))
    ));
}

#[test]
fn test_first_pixel_nside_1() {
    let d = pix2ang_ring(1, 0).unwrap();
    assert_abs_diff_eq!(d.theta(), (2.0f64 / 3.0).acos(), epsilon = 1e-12);
    assert_abs_diff_eq!(d.phi(), PI / 4.0, epsilon = 1e-12);

    // The equatorial ring of nside 1 starts at phi = 0.
    let d = pix2ang_ring(1, 4).unwrap();
    assert_abs_diff_eq!(d.theta(), FRAC_PI_2, epsilon = 1e-12);
    assert_abs_diff_eq!(d.phi(), 0.0, epsilon = 1e-12);
}

#[test]
fn test_round_trip_all_pixels() {
    for nside in [1, 2, 4, 8, 16] {
        let npix = nside2npix(nside);
        for pixel in 0..npix {
            let d = pix2ang_ring(nside, pixel).unwrap();
            assert_eq!(ang2pix_ring(nside, &d).unwrap(), pixel, "nside {nside}");
        }
    }
}

#[test]
fn test_pixel_out_of_range() {
    assert!(matches!(
        pix2ang_ring(2, 48),
        Err(HealpixError::PixelOutOfRange { pixel: 48, .. })
    ));
}

#[test]
fn test_poles() {
    let north = Direction::new(0.0, 0.0).unwrap();
    assert!(ang2pix_ring(4, &north).unwrap() < 4);
    let south = Direction::new(PI, 0.0).unwrap();
    let npix = nside2npix(4);
    assert!(ang2pix_ring(4, &south).unwrap() >= npix - 4);
}
