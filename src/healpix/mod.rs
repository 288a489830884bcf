// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! HEALPix pixelisation in the RING scheme.
//!
//! Only the handful of operations needed to turn pixel indices into sky
//! directions (and back) are provided. The formulae are those of Górski et al.
//! (2005), ApJ 622, 759.

#[cfg(test)]
mod tests;

use thiserror::Error;

use crate::{
    constants::{FRAC_PI_2, PI, TAU},
    coord::Direction,
};

/// The largest `nside` accepted.
pub const MAX_NSIDE: u32 = 8192;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HealpixError {
    #[error("nside {0} is invalid; it must be a power of 2 between 1 and {MAX_NSIDE}")]
    InvalidNside(u32),

    #[error("Pixel index {pixel} is out of range for nside {nside} ({npix} pixels)")]
    PixelOutOfRange { pixel: usize, nside: u32, npix: usize },
}

/// Is this `nside` a power of two within the supported range?
pub fn is_valid_nside(nside: u32) -> bool {
    (1..=MAX_NSIDE).contains(&nside) && nside.is_power_of_two()
}

/// The number of pixels covering the sky at this `nside`.
pub fn nside2npix(nside: u32) -> usize {
    let n = nside as usize;
    12 * n * n
}

fn isqrt(v: u64) -> u64 {
    let mut r = (v as f64).sqrt() as u64;
    // Guard against the float estimate landing either side of the true root.
    while r * r > v {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= v {
        r += 1;
    }
    r
}

/// Get the (z = cos θ, φ) of the centre of a RING pixel.
fn pix2zphi_ring(nside: u64, pixel: u64) -> (f64, f64) {
    let ncap = 2 * nside * (nside - 1);
    let npix = 12 * nside * nside;
    let fact2 = 4.0 / npix as f64;

    if pixel < ncap {
        // North polar cap.
        let iring = (1 + isqrt(1 + 2 * pixel)) >> 1;
        let iphi = (pixel + 1) - 2 * iring * (iring - 1);
        let z = 1.0 - (iring * iring) as f64 * fact2;
        let phi = (iphi as f64 - 0.5) * FRAC_PI_2 / iring as f64;
        (z, phi)
    } else if pixel < npix - ncap {
        // Equatorial belt.
        let fact1 = (2 * nside) as f64 * fact2;
        let ip = pixel - ncap;
        let iring = ip / (4 * nside) + nside;
        let iphi = ip % (4 * nside) + 1;
        let fodd = if (iring + nside) & 1 == 1 { 1.0 } else { 0.5 };
        let nl2 = 2 * nside;
        let z = (nl2 as f64 - iring as f64) * fact1;
        let phi = (iphi as f64 - fodd) * PI / nl2 as f64;
        (z, phi)
    } else {
        // South polar cap.
        let ip = npix - pixel;
        let iring = (1 + isqrt(2 * ip - 1)) >> 1;
        let iphi = 4 * iring + 1 - (ip - 2 * iring * (iring - 1));
        let z = -1.0 + (iring * iring) as f64 * fact2;
        let phi = (iphi as f64 - 0.5) * FRAC_PI_2 / iring as f64;
        (z, phi)
    }
}

/// The direction of the centre of RING pixel `pixel`.
pub fn pix2ang_ring(nside: u32, pixel: usize) -> Result<Direction, HealpixError> {
    if !is_valid_nside(nside) {
        return Err(HealpixError::InvalidNside(nside));
    }
    let npix = nside2npix(nside);
    if pixel >= npix {
        return Err(HealpixError::PixelOutOfRange {
            pixel,
            nside,
            npix,
        });
    }
    let (z, phi) = pix2zphi_ring(u64::from(nside), pixel as u64);
    let theta = z.clamp(-1.0, 1.0).acos();
    Ok(Direction::new_unchecked(theta, phi))
}

/// The RING pixel containing `direction`.
pub fn ang2pix_ring(nside: u32, direction: &Direction) -> Result<usize, HealpixError> {
    if !is_valid_nside(nside) {
        return Err(HealpixError::InvalidNside(nside));
    }
    let nside = i64::from(nside);
    let z = direction.theta().cos();
    let za = z.abs();
    // in [0, 4)
    let tt = direction.phi().rem_euclid(TAU) / FRAC_PI_2;

    let pixel = if za <= 2.0 / 3.0 {
        // Equatorial belt.
        let temp1 = nside as f64 * (0.5 + tt);
        let temp2 = nside as f64 * z * 0.75;
        let jp = (temp1 - temp2) as i64;
        let jm = (temp1 + temp2) as i64;

        let ir = nside + 1 + jp - jm;
        let kshift = 1 - (ir & 1);

        let ip = (jp + jm - nside + kshift + 1) / 2;
        let ip = ip.rem_euclid(4 * nside);

        nside * (nside - 1) * 2 + (ir - 1) * 4 * nside + ip
    } else {
        // Polar caps.
        let tp = tt - tt.trunc();
        let tmp = nside as f64 * (3.0 * (1.0 - za)).sqrt();

        let jp = (tp * tmp) as i64;
        let jm = ((1.0 - tp) * tmp) as i64;

        let ir = jp + jm + 1;
        let ip = (tt * ir as f64) as i64;
        let ip = ip.rem_euclid(4 * ir);

        if z > 0.0 {
            2 * ir * (ir - 1) + ip
        } else {
            12 * nside * nside - 2 * ir * (ir + 1) + ip
        }
    };

    Ok(pixel as usize)
}
