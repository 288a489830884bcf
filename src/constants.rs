// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision and in SI units. Quantities carried
around `skylos` are plain `f64`s in SI units; the multipliers here convert from
the units people actually talk about (kpc, GeV, MHz, μG) into SI.
 */

pub use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Speed of light in a vacuum \[m/s\].
pub const C_LIGHT: f64 = 299_792_458.0;

/// Elementary charge \[C\].
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Electron mass \[kg\].
pub const ELECTRON_MASS: f64 = 9.109_383_701_5e-31;

/// Proton mass \[kg\].
pub const PROTON_MASS: f64 = 1.672_621_923_69e-27;

/// Neutral pion mass \[kg\].
pub const PION_MASS: f64 = 2.406_176_6e-28;

/// Vacuum permittivity \[F/m\].
pub const EPSILON_0: f64 = 8.854_187_812_8e-12;

/// Boltzmann constant \[J/K\].
pub const K_BOLTZMANN: f64 = 1.380_649e-23;

/// Planck constant \[J s\].
pub const H_PLANCK: f64 = 6.626_070_15e-34;

/// Fine-structure constant.
pub const ALPHA_FINE: f64 = 7.297_352_569_3e-3;

/// Classical electron radius \[m\].
pub const R_ELECTRON: f64 = 2.817_940_326_2e-15;

/// Thomson cross section \[m^2\].
pub const SIGMA_THOMSON: f64 = 6.652_458_732_1e-29;

/// Solar mass \[kg\].
pub const SOLAR_MASS: f64 = 1.988_47e30;

/// Temperature of the cosmic microwave background \[K\].
pub const CMB_TEMPERATURE: f64 = 2.725;

/// Euler–Mascheroni constant.
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Electron rest energy \[J\].
pub const ELECTRON_REST_ENERGY: f64 = ELECTRON_MASS * C_LIGHT * C_LIGHT;

/// Proton rest energy \[J\].
pub const PROTON_REST_ENERGY: f64 = PROTON_MASS * C_LIGHT * C_LIGHT;

/// Neutral pion rest energy \[J\].
pub const PION_REST_ENERGY: f64 = PION_MASS * C_LIGHT * C_LIGHT;

// Unit multipliers.

/// One parsec \[m\].
pub const PC: f64 = 3.085_677_581_491_367e16;
/// One kiloparsec \[m\].
pub const KPC: f64 = 1e3 * PC;
/// One centimetre \[m\].
pub const CM: f64 = 1e-2;
/// One gram \[kg\].
pub const GRAM: f64 = 1e-3;

/// One electronvolt \[J\].
pub const EV: f64 = ELEMENTARY_CHARGE;
/// One kiloelectronvolt \[J\].
pub const KEV: f64 = 1e3 * EV;
/// One megaelectronvolt \[J\].
pub const MEV: f64 = 1e6 * EV;
/// One gigaelectronvolt \[J\].
pub const GEV: f64 = 1e9 * EV;
/// One teraelectronvolt \[J\].
pub const TEV: f64 = 1e12 * EV;

/// One kilohertz \[Hz\].
pub const KHZ: f64 = 1e3;
/// One megahertz \[Hz\].
pub const MHZ: f64 = 1e6;
/// One gigahertz \[Hz\].
pub const GHZ: f64 = 1e9;

/// One gauss \[T\].
pub const GAUSS: f64 = 1e-4;
/// One microgauss \[T\].
pub const MICRO_GAUSS: f64 = 1e-6 * GAUSS;

// Defaults.

/// The observer's default distance from the Galactic centre, along the x axis
/// \[m\].
pub const DEFAULT_OBSERVER_X: f64 = 8.5 * KPC;

/// Default radius of the spherical Galactic boundary \[m\].
pub const DEFAULT_BOUNDARY_RADIUS: f64 = 35.0 * KPC;

/// Default half-height of the Galactic disk \[m\].
pub const DEFAULT_BOUNDARY_HALF_HEIGHT: f64 = 5.0 * KPC;

/// In-plane half-extent of default cache tables \[m\].
pub const DEFAULT_CACHE_HALF_EXTENT_XY: f64 = 30.0 * KPC;

/// Vertical half-extent of default cache tables \[m\].
pub const DEFAULT_CACHE_HALF_EXTENT_Z: f64 = 5.0 * KPC;

/// Default cache table size (x, y, z) for integrators that can use one.
pub const DEFAULT_CACHE_GRID: [usize; 3] = [20, 20, 5];

/// Default number of energies tabulated for cosmic-ray spectra.
pub const DEFAULT_ENERGY_STEPS: usize = 60;

/// Default HEALPix resolution of sky maps.
pub const DEFAULT_NSIDE: u32 = 32;

/// Default frequency used for radio sky maps \[Hz\].
pub const DEFAULT_RADIO_FREQUENCY: f64 = 408.0 * MHZ;

/// Default photon energy used for gamma-ray sky maps \[J\].
pub const DEFAULT_GAMMA_ENERGY: f64 = 1.0 * GEV;

/// Default relative tolerance of adaptive Gauss–Kronrod quadrature.
pub const DEFAULT_QAG_REL_TOLERANCE: f64 = 1e-4;

/// Default maximum number of subintervals of adaptive Gauss–Kronrod
/// quadrature.
pub const DEFAULT_QAG_LIMIT: usize = 1000;

/// The value marking pixels that were not computed (masked, cancelled or
/// failed). This matches the HEALPix convention.
pub const UNSEEN: f64 = -1.6375e30;
