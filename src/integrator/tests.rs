// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{str::FromStr, sync::Arc};

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nalgebra::Vector3;
use vec1::{vec1, Vec1};

use super::{energy::*, free_free::spectral_emissivity, *};
use crate::{
    models::*,
    quadrature::QuadratureError,
    scheduler::{CancelToken, JobError},
};

/// The same density everywhere.
struct ConstantGas {
    density: f64,
    temperature: f64,
}

impl IonizedGasDensity for ConstantGas {
    fn density(&self, _: &Position) -> f64 {
        self.density
    }

    fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl NeutralGasDensity for ConstantGas {
    fn density(&self, _: &Position) -> f64 {
        self.density
    }
}

fn constant_gas(density: f64) -> Arc<ConstantGas> {
    Arc::new(ConstantGas {
        density,
        temperature: 1e4,
    })
}

fn towards_centre() -> Direction {
    Direction::from_galactic(0.0, 0.0).unwrap()
}

fn smooth_disk() -> ExponentialDisk {
    ExponentialDisk::new(1e6, 10.0 * KPC, 3.0 * KPC, 100.0).unwrap()
}

fn smooth_protons() -> PowerLawCosmicRays {
    let axis = EnergyAxis::geometric_with_steps(2.0 * GEV, 1e4 * GEV, 20).unwrap();
    PowerLawCosmicRays::local_protons(axis)
        .with_spatial_scales(10.0 * KPC, 3.0 * KPC)
        .unwrap()
}

fn pi_zero() -> PiZeroIntegrator {
    PiZeroIntegrator::new(
        vec1![Arc::new(smooth_protons()) as Arc<dyn CosmicRayDensity>],
        Arc::new(smooth_disk()),
        Arc::new(PionDecayCrossSection::new()),
    )
}

fn electrons(steps: usize) -> PowerLawCosmicRays {
    let axis = EnergyAxis::geometric_with_steps(0.01 * GEV, 1e4 * GEV, steps).unwrap();
    PowerLawCosmicRays::local_electrons(axis)
}

#[test]
fn test_kind_names() {
    assert_eq!(IntegratorKind::DispersionMeasure.to_string(), "dm");
    assert_eq!(IntegratorKind::FreeFree.to_string(), "free-free");
    assert_eq!(
        IntegratorKind::from_str("synchro-absorption").unwrap(),
        IntegratorKind::SynchroAbsorption
    );
    assert_eq!(
        IntegratorKind::from_str("rm").unwrap(),
        IntegratorKind::RotationMeasure
    );
    assert_eq!(
        IntegratorKind::from_str("dark-matter").unwrap(),
        IntegratorKind::DarkMatter
    );
    assert_eq!(
        IntegratorKind::from_str("pi-zero-absorption").unwrap(),
        IntegratorKind::PiZeroAbsorption
    );
    assert!(IntegratorKind::from_str("axion-decay").is_err());
    assert!(IntegratorKind::DarkMatter.is_gamma_ray());
    assert_eq!(
        IntegratorKind::PiZeroAbsorption.pixel_units(),
        IntegratorKind::PiZero.pixel_units()
    );

    let kind: IntegratorKind = serde_json::from_str("\"inverse-compton\"").unwrap();
    assert_eq!(kind, IntegratorKind::InverseCompton);
    assert_eq!(serde_json::to_string(&IntegratorKind::DispersionMeasure).unwrap(), "\"dm\"");

    assert!(INTEGRATOR_KINDS_COMMA_SEPARATED.contains("pi-zero"));
    assert_eq!(IntegratorKind::Synchrotron.default_parameter(), DEFAULT_RADIO_FREQUENCY);
    assert_eq!(IntegratorKind::PiZero.default_parameter(), DEFAULT_GAMMA_ENERGY);
    assert_eq!(IntegratorKind::RotationMeasure.pixel_units(), "rad m^-2");
}

#[test]
fn test_sum_and_log_energy_integration_converge() {
    let exact = 0.99;
    let f = |e: f64| e.powi(-2);
    let mut previous_difference = f64::INFINITY;
    for steps in [20, 200, 2000] {
        let geometric = EnergyAxis::geometric_with_steps(1.0, 100.0, steps).unwrap();
        let tabulated = EnergyAxis::tabulated(geometric.energies().to_vec()).unwrap();
        assert!(geometric.exists_scale_factor());
        assert!(!tabulated.exists_scale_factor());

        let log = integrate_over_energy_axis(&geometric, 0, f);
        let sum = integrate_over_energy_axis(&tabulated, 0, f);
        let difference = (log - sum).abs();
        assert!(difference < previous_difference);
        previous_difference = difference;

        if steps == 2000 {
            assert_relative_eq!(log, exact, max_relative = 5e-3);
            assert_relative_eq!(sum, exact, max_relative = 5e-3);
        }
    }
}

#[test]
fn test_energy_integration_start_index() {
    let geometric = EnergyAxis::geometric_with_steps(1.0, 8.0, 4).unwrap();
    // 1, 2, 4, 8 with ln 2 weights.
    let all = integrate_over_energy_axis(&geometric, 0, |_| 1.0);
    assert_relative_eq!(all, 15.0 * 2f64.ln(), max_relative = 1e-12);
    let from_four = integrate_over_energy_axis(&geometric, 2, |_| 1.0);
    assert_relative_eq!(from_four, 12.0 * 2f64.ln(), max_relative = 1e-12);
    assert_eq!(integrate_over_energy_axis(&geometric, 10, |_| 1.0), 0.0);

    let tabulated = EnergyAxis::tabulated(vec![1.0, 2.0, 4.0, 8.0]).unwrap();
    assert_relative_eq!(integrate_over_energy_axis(&tabulated, 0, |_| 1.0), 7.0);
    assert_relative_eq!(integrate_over_energy_axis(&tabulated, 2, |_| 1.0), 6.0);

    // Indices line up with energies.
    integrate_over_energy_axis_indexed(&tabulated, 0, |i, e| {
        assert_eq!(tabulated.energies()[i], e);
        0.0
    });
    integrate_over_energy_axis_indexed(&geometric, 0, |i, e| {
        assert_eq!(geometric.energies()[i], e);
        0.0
    });
}

#[test]
fn test_max_distance() {
    let dm = DispersionMeasureIntegrator::new(constant_gas(1.0));
    let d = dm.get_max_distance(&towards_centre()).unwrap();
    assert_relative_eq!(d, DEFAULT_BOUNDARY_RADIUS + DEFAULT_OBSERVER_X, max_relative = 1e-12);
    let away = Direction::from_galactic(0.0, PI).unwrap();
    let d = dm.get_max_distance(&away).unwrap();
    assert_relative_eq!(d, DEFAULT_BOUNDARY_RADIUS - DEFAULT_OBSERVER_X, max_relative = 1e-12);
}

#[test]
fn test_dm_of_uniform_gas() {
    let n = 0.03 / (CM * CM * CM);
    let dm = DispersionMeasureIntegrator::new(constant_gas(n));
    for direction in [
        towards_centre(),
        Direction::from_galactic_degrees(30.0, 120.0).unwrap(),
        Direction::from_galactic_degrees(-75.0, 300.0).unwrap(),
    ] {
        let d_max = dm.get_max_distance(&direction).unwrap();
        let result = dm.integrate_over_los(&direction).unwrap();
        assert_relative_eq!(result, n * d_max, max_relative = 1e-10);
    }
}

#[test]
fn test_dm_observer_can_move() {
    let mut dm = DispersionMeasureIntegrator::new(constant_gas(1.0));
    dm.set_observer_position(Position::zeros());
    assert_eq!(dm.get_observer_position(), Position::zeros());
    let result = dm.integrate_over_los(&towards_centre()).unwrap();
    assert_relative_eq!(result, DEFAULT_BOUNDARY_RADIUS, max_relative = 1e-10);

    dm.set_observer_position(Position::new(50.0 * KPC, 0.0, 0.0));
    assert!(matches!(
        dm.integrate_over_los(&towards_centre()),
        Err(IntegratorError::Coord(_))
    ));
}

#[test]
fn test_rm_of_uniform_field() {
    let n = 0.03 / (CM * CM * CM);
    // Pointing away from the centre, i.e. at an observer looking inwards.
    let field = UniformField(Vector3::new(MICRO_GAUSS, 0.0, 0.0));
    let rm = RotationMeasureIntegrator::new(Arc::new(field), constant_gas(n));

    let direction = towards_centre();
    let d_max = rm.get_max_distance(&direction).unwrap();
    let result = rm.integrate_over_los(&direction).unwrap();
    // RM ≈ 0.812 n[cm^-3] B[μG] L[pc]
    let expected = 0.812 * 0.03 * 1.0 * d_max / PC;
    assert_relative_eq!(result, expected, max_relative = 1e-3);

    // Looking the other way flips the sign.
    let away = Direction::from_galactic(0.0, PI).unwrap();
    let d_max = rm.get_max_distance(&away).unwrap();
    let result = rm.integrate_over_los(&away).unwrap();
    assert_relative_eq!(result, -0.812 * 0.03 * d_max / PC, max_relative = 1e-3);

    // A perpendicular field does nothing.
    let up = Direction::from_galactic(FRAC_PI_2, 0.0).unwrap();
    assert_abs_diff_eq!(rm.integrate_over_los(&up).unwrap(), 0.0, epsilon = 1e-9);
}

#[test]
fn test_free_free_emissivity() {
    let n = 1e6;
    for (freq, expected) in [(10.0 * MHZ, 6.2158e-40), (GHZ, 4.4787e-40), (22.0 * GHZ, 3.3125e-40)] {
        let e = spectral_emissivity(n, n, freq, 1e4, 1);
        assert_relative_eq!(e, expected, max_relative = 1e-3);
    }

    let ff = FreeFreeIntegrator::new(constant_gas(n));
    let pos = Position::zeros();
    assert_relative_eq!(
        ff.absorption_coefficient(&pos, 10.0 * MHZ),
        1.60997e-19,
        max_relative = 1e-3
    );
    assert_relative_eq!(
        ff.absorption_coefficient(&pos, GHZ),
        1.16005e-23,
        max_relative = 1e-3
    );
}

#[test]
fn test_free_free_temperature_of_uniform_gas() {
    let n = 1e6;
    let ff = FreeFreeIntegrator::new(constant_gas(n));
    let freq = GHZ;
    let direction = towards_centre();
    let d_max = ff.get_max_distance(&direction).unwrap();
    let intensity = spectral_emissivity(n, n, freq, 1e4, 1) * d_max / (4.0 * PI);
    let expected = intensity * C_LIGHT * C_LIGHT / (2.0 * freq * freq * K_BOLTZMANN);
    let result = ff.integrate_over_los_with(&direction, freq).unwrap();
    assert_relative_eq!(result, expected, max_relative = 1e-10);

    assert!(matches!(
        ff.integrate_over_los_with(&direction, 0.0),
        Err(IntegratorError::BadParameter { .. })
    ));
}

#[test]
fn test_synchrotron_kernel() {
    assert_eq!(synchrotron_kernel(0.0), 0.0);
    assert_relative_eq!(synchrotron_kernel(0.001), 0.2131, max_relative = 5e-3);
    assert_relative_eq!(synchrotron_kernel(0.1), 0.8182, max_relative = 5e-3);
    assert_relative_eq!(synchrotron_kernel(0.29), 0.9180, max_relative = 5e-3);
    assert_relative_eq!(synchrotron_kernel(1.0), 0.6514, max_relative = 5e-3);
    assert_relative_eq!(synchrotron_kernel(5.0), 0.02132, max_relative = 5e-3);
    assert!(synchrotron_kernel(100.0) < 1e-40);
}

#[test]
fn test_synchrotron_power_law_scaling() {
    // For electrons with dN/dE ∝ E^-p, j ∝ B⊥^((p+1)/2) ν^(-(p-1)/2).
    let p = 3.1;
    let b = 6.0 * MICRO_GAUSS;
    let line_of_sight = Vector3::new(0.0, 0.0, 1.0);
    let pos = Position::new(DEFAULT_OBSERVER_X, 0.0, 0.0);
    let emissivity = |b: f64, freq: f64| {
        let synchrotron = SynchrotronIntegrator::new(
            Arc::new(UniformField(Vector3::new(b, 0.0, 0.0))),
            Arc::new(electrons(100)),
        );
        synchrotron.emissivity(&pos, &line_of_sight, freq)
    };

    let j = emissivity(b, 408.0 * MHZ);
    assert!(j > 0.0);
    assert_relative_eq!(
        emissivity(2.0 * b, 408.0 * MHZ) / j,
        2f64.powf((p + 1.0) / 2.0),
        max_relative = 1e-4
    );
    assert_relative_eq!(
        emissivity(b, 816.0 * MHZ) / j,
        2f64.powf(-(p - 1.0) / 2.0),
        max_relative = 1e-4
    );
}

#[test]
fn test_synchrotron_needs_a_perpendicular_field() {
    let field = UniformField(Vector3::new(0.0, 0.0, 6.0 * MICRO_GAUSS));
    let synchrotron = SynchrotronIntegrator::new(Arc::new(field), Arc::new(electrons(30)));
    let up = Direction::from_galactic(FRAC_PI_2, 0.0).unwrap();
    assert_eq!(synchrotron.integrate_over_los(&up).unwrap(), 0.0);
    assert!(synchrotron.integrate_over_los(&towards_centre()).unwrap() > 0.0);
}

#[test]
fn test_synchro_absorption_without_gas_is_synchrotron() {
    let field = Arc::new(ToroidalField::default());
    let cr = Arc::new(electrons(30));
    let absorbed = SynchroAbsorptionIntegrator::new(field.clone(), cr.clone(), constant_gas(0.0));
    let plain = SynchrotronIntegrator::new(field, cr).with_rule(QuadratureRule::Trapezoid { steps: 500 });

    let direction = Direction::from_galactic_degrees(5.0, 40.0).unwrap();
    let a = absorbed.integrate_over_los(&direction).unwrap();
    let b = plain.integrate_over_los(&direction).unwrap();
    assert!(b > 0.0);
    assert_relative_eq!(a, b, max_relative = 1e-10);
}

#[test]
fn test_synchro_absorption_attenuates() {
    let field = Arc::new(ToroidalField::default());
    let cr = Arc::new(electrons(30));
    let freq = 10.0 * MHZ;
    let absorbed = SynchroAbsorptionIntegrator::new(field.clone(), cr.clone(), constant_gas(1e5));
    let plain = SynchrotronIntegrator::new(field, cr);

    let direction = Direction::from_galactic_degrees(0.0, 40.0).unwrap();
    let a = absorbed.integrate_over_los_with(&direction, freq).unwrap();
    let b = plain.integrate_over_los_with(&direction, freq).unwrap();
    assert!(a > 0.0);
    assert!(a < b);

    // Optical depth grows with distance.
    let near = absorbed.optical_depth(&direction, KPC, freq).unwrap();
    let far = absorbed.optical_depth(&direction, 10.0 * KPC, freq).unwrap();
    assert!(near > 0.0);
    assert_relative_eq!(far, 10.0 * near, max_relative = 1e-10);

    // The profile is attenuated emission.
    let profile = absorbed.los_profile(&direction, freq, 10).unwrap();
    assert_eq!(profile.values.len(), 11);
    assert!(profile.values[10] < profile.values[0]);
}

#[test]
fn test_los_profile() {
    let dm = DispersionMeasureIntegrator::new(constant_gas(2.0));
    let direction = towards_centre();
    let profile = dm.los_profile(&direction, 0.0, 4).unwrap();
    assert_eq!(profile.distances.len(), 5);
    assert_eq!(profile.distances[0], 0.0);
    assert_relative_eq!(
        profile.distances[4],
        dm.get_max_distance(&direction).unwrap(),
        max_relative = 1e-12
    );
    assert!(profile.values.iter().all(|&v| v == 2.0));
}

#[test]
fn test_cache_unsupported() {
    let mut dm = DispersionMeasureIntegrator::new(constant_gas(1.0));
    assert!(matches!(
        dm.setup_cache_table(4, 4, 2),
        Err(IntegratorError::CacheUnsupported(IntegratorKind::DispersionMeasure))
    ));
    assert_eq!(dm.status(), IntegratorStatus::Ready);
    assert!(!dm.is_cache_table_enabled());

    let mut ff = FreeFreeIntegrator::new(constant_gas(1.0));
    assert!(ff.setup_cache_table(4, 4, 2).is_err());
}

#[test]
fn test_cache_lifecycle() {
    let mut integrator = pi_zero();
    let cancel = CancelToken::new();
    let direction = Direction::from_galactic_degrees(10.0, 30.0).unwrap();
    assert_eq!(integrator.status(), IntegratorStatus::Ready);
    let direct = integrator.integrate_over_los(&direction).unwrap();
    assert!(direct > 0.0);

    integrator.setup_cache_table(4, 4, 2).unwrap();
    assert_eq!(integrator.status(), IntegratorStatus::CacheSetup);
    assert!(integrator.is_cache_table_enabled());
    assert!(!integrator.is_cache_table_initialized());
    // Set up but empty: no silent fallbacks.
    assert!(matches!(
        integrator.integrate_over_los(&direction),
        Err(IntegratorError::CacheNotInitialized(IntegratorKind::PiZero))
    ));

    integrator.init_cache_table_with_threads(2, &cancel).unwrap();
    assert_eq!(integrator.status(), IntegratorStatus::CacheInitialized);
    assert!(integrator.integrate_over_los(&direction).is_ok());

    // The same parameter keeps the cache.
    integrator.set_skymap_parameter(DEFAULT_GAMMA_ENERGY);
    assert!(integrator.is_cache_table_initialized());

    // A new parameter empties it.
    integrator.set_skymap_parameter(2.0 * GEV);
    assert_eq!(integrator.status(), IntegratorStatus::CacheSetup);
    assert!(matches!(
        integrator.integrate_over_los(&direction),
        Err(IntegratorError::CacheNotInitialized(_))
    ));
    integrator.init_cache_table_with_threads(2, &cancel).unwrap();
    assert!(integrator.is_cache_table_initialized());

    // So does moving the observer.
    integrator.set_observer_position(Position::new(8.0 * KPC, 0.0, 0.0));
    assert!(!integrator.is_cache_table_initialized());
}

#[test]
fn test_cache_is_only_used_for_its_parameter() {
    let mut integrator = pi_zero();
    integrator.setup_cache_table(4, 4, 2).unwrap();
    integrator
        .init_cache_table_with_threads(1, &CancelToken::new())
        .unwrap();

    // A point well off the grid nodes; the coarse cache is way off there.
    let pos = Position::new(4.6 * KPC, 1.7 * KPC, 2.2 * KPC);
    let direction = towards_centre();
    let other_energy = 3.0 * GEV;
    assert_eq!(
        integrator.per_point(&pos, &direction, other_energy).unwrap(),
        integrator.emissivity(&pos, other_energy)
    );
}

#[test]
fn test_cancelled_cache_fill() {
    let mut integrator = pi_zero();
    integrator.setup_cache_table(4, 4, 2).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        integrator.init_cache_table_with_threads(2, &cancel),
        Err(IntegratorError::CacheFillCancelled)
    ));
    assert_eq!(integrator.status(), IntegratorStatus::CacheSetup);
}

#[test]
fn test_cached_values_match_direct_values() {
    let cancel = CancelToken::new();
    let e_gamma = DEFAULT_GAMMA_ENERGY;
    let direction = towards_centre();

    // On a grid node the cache is exact.
    let mut coarse = pi_zero();
    coarse.setup_cache_table(20, 20, 5).unwrap();
    coarse.init_cache_table_with_threads(4, &cancel).unwrap();
    let node = Position::new(3.0 * KPC, -6.0 * KPC, 1.0 * KPC);
    assert_relative_eq!(
        coarse.per_point(&node, &direction, e_gamma).unwrap(),
        coarse.emissivity(&node, e_gamma),
        max_relative = 1e-10
    );

    // Between nodes the error shrinks with the cell size.
    let pos = Position::new(4.6 * KPC, 1.7 * KPC, 2.2 * KPC);
    let direct = coarse.emissivity(&pos, e_gamma);
    let coarse_error = (coarse.per_point(&pos, &direction, e_gamma).unwrap() / direct - 1.0).abs();
    assert!(coarse_error < 0.3, "{coarse_error}");

    let mut fine = pi_zero();
    fine.setup_cache_table(60, 60, 20).unwrap();
    fine.init_cache_table_with_threads(4, &cancel).unwrap();
    let fine_error = (fine.per_point(&pos, &direction, e_gamma).unwrap() / direct - 1.0).abs();
    assert!(fine_error < 0.03, "{fine_error}");
    assert!(fine_error < coarse_error);

    // Whole lines of sight agree too.
    let direction = Direction::from_galactic_degrees(5.0, 60.0).unwrap();
    let cached = fine.integrate_over_los(&direction).unwrap();
    let uncached = pi_zero().integrate_over_los(&direction).unwrap();
    assert_relative_eq!(cached, uncached, max_relative = 0.05);
}

#[test]
fn test_pi_zero_sums_species() {
    let one = pi_zero();
    let two = PiZeroIntegrator::new(
        vec1![
            Arc::new(smooth_protons()) as Arc<dyn CosmicRayDensity>,
            Arc::new(smooth_protons()) as Arc<dyn CosmicRayDensity>
        ],
        Arc::new(smooth_disk()),
        Arc::new(PionDecayCrossSection::new()),
    );
    let pos = Position::new(5.0 * KPC, 2.0 * KPC, 0.1 * KPC);
    let e = 10.0 * GEV;
    assert!(one.emissivity(&pos, e) > 0.0);
    assert_relative_eq!(two.emissivity(&pos, e), 2.0 * one.emissivity(&pos, e), max_relative = 1e-12);

    // No projectiles above the photon energy, no photons.
    assert_eq!(one.emissivity(&pos, 2e4 * GEV), 0.0);
}

fn energetic_protons() -> Vec1<Arc<dyn CosmicRayDensity>> {
    let axis = EnergyAxis::geometric_with_steps(2.0 * GEV, 1e7 * GEV, 40).unwrap();
    vec1![Arc::new(
        PowerLawCosmicRays::local_protons(axis)
            .with_spatial_scales(10.0 * KPC, 3.0 * KPC)
            .unwrap()
    ) as Arc<dyn CosmicRayDensity>]
}

fn pi_zero_pair(cmb_temperature: f64) -> (PiZeroAbsorptionIntegrator, PiZeroIntegrator) {
    let cross_section = Arc::new(PionDecayCrossSection::new());
    let absorbed = PiZeroAbsorptionIntegrator::new(
        energetic_protons(),
        Arc::new(smooth_disk()),
        cross_section.clone(),
    )
    .with_cmb_temperature(cmb_temperature);
    let plain = PiZeroIntegrator::new(energetic_protons(), Arc::new(smooth_disk()), cross_section);
    (absorbed, plain)
}

#[test]
fn test_pi_zero_absorption_below_pair_threshold() {
    let (absorbed, plain) = pi_zero_pair(CMB_TEMPERATURE);
    assert_eq!(absorbed.absorption_coefficient(GEV), Ok(0.0));
    assert_eq!(absorbed.absorption_coefficient(10.0 * TEV), Ok(0.0));

    let direction = Direction::from_galactic_degrees(2.0, 30.0).unwrap();
    let a = absorbed.integrate_over_los_with(&direction, GEV).unwrap();
    let b = plain.integrate_over_los_with(&direction, GEV).unwrap();
    assert!(b > 0.0);
    assert_relative_eq!(a, b, max_relative = 1e-12);
}

#[test]
fn test_pi_zero_absorption_attenuates() {
    let (absorbed, plain) = pi_zero_pair(CMB_TEMPERATURE);
    let direction = towards_centre();
    for e in [GEV, 100.0 * TEV, 500.0 * TEV, 2000.0 * TEV] {
        let a = absorbed.integrate_over_los_with(&direction, e).unwrap();
        let b = plain.integrate_over_los_with(&direction, e).unwrap();
        assert!(b > 0.0);
        assert!(a <= b * (1.0 + 1e-12));
    }

    let e = 2000.0 * TEV;
    let a = absorbed.integrate_over_los_with(&direction, e).unwrap();
    let b = plain.integrate_over_los_with(&direction, e).unwrap();
    assert!(a > 0.0);
    assert!(a < 0.8 * b);

    // The profile is the emission times exp(-K d).
    let k = absorbed.absorption_coefficient(e).unwrap();
    let profile = absorbed.los_profile(&direction, e, 4).unwrap();
    let observer = absorbed.get_observer_position();
    for (d, v) in profile.distances.iter().zip(profile.values.iter()) {
        let pos = galactic_position(&observer, *d, &direction);
        assert_relative_eq!(
            *v,
            plain.emissivity(&pos, e) * (-k * d).exp(),
            max_relative = 1e-12
        );
    }
}

#[test]
fn test_pi_zero_absorption_length() {
    let (absorbed, _) = pi_zero_pair(CMB_TEMPERATURE);
    // The CMB is most opaque at a couple of PeV.
    let k = absorbed.absorption_coefficient(2000.0 * TEV).unwrap();
    assert_relative_eq!(1.0 / k / KPC, 7.09, max_relative = 1e-2);
    let k_1 = absorbed.absorption_coefficient(1000.0 * TEV).unwrap();
    assert_relative_eq!(1.0 / k_1 / KPC, 8.95, max_relative = 1e-2);
}

#[test]
fn test_pi_zero_absorption_vanishes_with_the_cmb() {
    let e = 2000.0 * TEV;
    let direction = towards_centre();
    let mut previous = f64::INFINITY;
    for t in [CMB_TEMPERATURE, 1.5, 0.5] {
        let k = pi_zero_pair(t).0.absorption_coefficient(e).unwrap();
        assert!(k < previous);
        previous = k;
    }

    let (absorbed, plain) = pi_zero_pair(0.0);
    assert_eq!(absorbed.absorption_coefficient(e), Ok(0.0));
    assert_relative_eq!(
        absorbed.integrate_over_los_with(&direction, e).unwrap(),
        plain.integrate_over_los_with(&direction, e).unwrap(),
        max_relative = 1e-12
    );
}

#[test]
fn test_pi_zero_absorption_cache() {
    let (mut absorbed, _) = pi_zero_pair(CMB_TEMPERATURE);
    let e = 2000.0 * TEV;
    absorbed.set_skymap_parameter(e);
    absorbed.setup_cache_table(8, 8, 4).unwrap();
    absorbed
        .init_cache_table_with_threads(2, &CancelToken::new())
        .unwrap();
    assert!(absorbed.is_cache_table_initialized());

    let node = absorbed
        .state()
        .cache_table()
        .map(|t| t.position_from_index(37))
        .unwrap();
    let k = absorbed.absorption_coefficient(e).unwrap();
    let distance = (node - absorbed.get_observer_position()).norm();
    assert_relative_eq!(
        absorbed.per_point(&node, &towards_centre(), e).unwrap(),
        absorbed.emissivity(&node, e) * (-k * distance).exp(),
        max_relative = 1e-10
    );
}

/// The same dark-matter density everywhere.
struct ConstantHalo(f64);

impl DarkMatterProfile for ConstantHalo {
    fn mass_density(&self, _: f64) -> f64 {
        self.0
    }
}

fn dark_matter(profile: Arc<dyn DarkMatterProfile>) -> DarkMatterIntegrator {
    DarkMatterIntegrator::new(
        profile,
        Arc::new(QuarkContinuumSpectrum::new(100.0 * GEV).unwrap()),
    )
}

#[test]
fn test_dark_matter_emissivity() {
    let pos = Position::new(3.0 * KPC, 1.0 * KPC, 0.0);
    let rho = 1e-21;
    let one = dark_matter(Arc::new(ConstantHalo(rho)));
    let two = dark_matter(Arc::new(ConstantHalo(2.0 * rho)));

    let spectrum = QuarkContinuumSpectrum::new(100.0 * GEV).unwrap();
    let n = rho / (100.0 * GEV / (C_LIGHT * C_LIGHT));
    assert_relative_eq!(
        one.emissivity(&pos, GEV),
        0.5 * DEFAULT_ANNIHILATION_CROSS_SECTION * n * n * spectrum.particles_per_energy(GEV),
        max_relative = 1e-12
    );
    // Annihilation goes as the density squared.
    assert_relative_eq!(
        two.emissivity(&pos, GEV),
        4.0 * one.emissivity(&pos, GEV),
        max_relative = 1e-12
    );
    let doubled = dark_matter(Arc::new(ConstantHalo(rho)))
        .with_annihilation_cross_section(2.0 * DEFAULT_ANNIHILATION_CROSS_SECTION);
    assert_relative_eq!(
        doubled.emissivity(&pos, GEV),
        2.0 * one.emissivity(&pos, GEV),
        max_relative = 1e-12
    );
    // Nothing above the particle's mass.
    assert_eq!(one.emissivity(&pos, 200.0 * GEV), 0.0);
}

#[test]
fn test_dark_matter_los() {
    let integrator = dark_matter(Arc::new(NfwProfile::milky_way()));
    let inner = Direction::from_galactic_degrees(10.0, 0.0).unwrap();
    let outer = Direction::from_galactic_degrees(10.0, 180.0).unwrap();
    let a = integrator.integrate_over_los_with(&inner, GEV).unwrap();
    let b = integrator.integrate_over_los_with(&outer, GEV).unwrap();
    assert!(b > 0.0);
    assert!(a > b);
    assert_eq!(integrator.integrate_over_los_with(&inner, 200.0 * GEV).unwrap(), 0.0);
    assert!(!integrator.supports_cache());

    // A uniform halo gives emissivity times path length.
    let uniform = dark_matter(Arc::new(ConstantHalo(1e-21)));
    let pos = Position::zeros();
    assert_relative_eq!(
        uniform.integrate_over_los_with(&outer, GEV).unwrap(),
        uniform.emissivity(&pos, GEV) * uniform.get_max_distance(&outer).unwrap() / (4.0 * PI),
        max_relative = 1e-8
    );
}

#[test]
fn test_bremsstrahlung() {
    let integrator = BremsstrahlungIntegrator::new(
        Arc::new(electrons(40)),
        Arc::new(smooth_disk()),
        Arc::new(BremsstrahlungCrossSection::new()),
    );
    let direction = Direction::from_galactic_degrees(2.0, 10.0).unwrap();
    let low = integrator.integrate_over_los_with(&direction, 0.1 * GEV).unwrap();
    let high = integrator.integrate_over_los_with(&direction, GEV).unwrap();
    assert!(high > 0.0);
    assert!(low > high);

    let empty = BremsstrahlungIntegrator::new(
        Arc::new(electrons(40)),
        constant_gas(0.0),
        Arc::new(BremsstrahlungCrossSection::new()),
    );
    assert_eq!(empty.integrate_over_los(&direction).unwrap(), 0.0);
}

fn inverse_compton() -> InverseComptonIntegrator {
    let photon_axis = EnergyAxis::geometric_with_steps(1e-5 * EV, 1e-2 * EV, 30).unwrap();
    let photons = BlackbodyPhotonField::new(2.725, 1.0, photon_axis).unwrap();
    let electron_axis = EnergyAxis::geometric_with_steps(GEV, 1e5 * GEV, 25).unwrap();
    InverseComptonIntegrator::new(
        Arc::new(PowerLawCosmicRays::local_electrons(electron_axis)),
        Arc::new(photons),
        Arc::new(KleinNishina),
    )
}

#[test]
fn test_inverse_compton_kernel_memo() {
    let mut integrator = inverse_compton();
    let pos = Position::new(DEFAULT_OBSERVER_X, 0.0, 0.0);
    assert_eq!(integrator.num_kernel_values(), 0);

    let e = integrator.emissivity(&pos, DEFAULT_GAMMA_ENERGY);
    assert!(e > 0.0);
    let cached = integrator.num_kernel_values();
    assert!(cached > 0);
    // The second evaluation hits the memo and agrees exactly.
    assert_eq!(integrator.emissivity(&pos, DEFAULT_GAMMA_ENERGY), e);
    assert_eq!(integrator.num_kernel_values(), cached);

    // Other photon energies bypass it.
    let other = integrator.emissivity(&pos, 10.0 * GEV);
    assert!(other > 0.0 && other < e);
    assert_eq!(integrator.num_kernel_values(), cached);

    // Changing the map's energy starts afresh, and gives the same answer as
    // not memoizing.
    integrator.set_skymap_parameter(10.0 * GEV);
    assert_eq!(integrator.num_kernel_values(), 0);
    assert_relative_eq!(integrator.emissivity(&pos, 10.0 * GEV), other, max_relative = 1e-14);
    assert!(integrator.num_kernel_values() > 0);
}

#[test]
fn test_inverse_compton_los() {
    let mut integrator = inverse_compton();
    let direction = Direction::from_galactic_degrees(45.0, 90.0).unwrap();
    let direct = integrator.integrate_over_los(&direction).unwrap();
    assert!(direct > 0.0);

    integrator.setup_cache_table(8, 8, 4).unwrap();
    integrator
        .init_cache_table_with_threads(2, &CancelToken::new())
        .unwrap();
    let node = integrator
        .state()
        .cache_table()
        .map(|t| t.position_from_index(37))
        .unwrap();
    assert_relative_eq!(
        integrator.per_point(&node, &direction, DEFAULT_GAMMA_ENERGY).unwrap(),
        integrator.emissivity(&node, DEFAULT_GAMMA_ENERGY),
        max_relative = 1e-10
    );
}

#[test]
fn test_error_recoverability() {
    let no_convergence = IntegratorError::Quadrature(QuadratureError::NoConvergence {
        lower: 0.0,
        upper: 1.0,
        estimate: 1.0,
        error_estimate: 1.0,
        limit: 1,
    });
    assert!(no_convergence.is_recoverable());
    assert!(IntegratorError::Quadrature(QuadratureError::NonFinite { x: 0.0 }).is_recoverable());
    assert!(!IntegratorError::Quadrature(QuadratureError::ZeroSteps).is_recoverable());
    assert!(!IntegratorError::CacheNotInitialized(IntegratorKind::PiZero).is_recoverable());
}
