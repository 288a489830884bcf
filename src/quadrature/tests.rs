// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{cell::Cell, f64::consts::PI};

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nalgebra::Vector3;

use super::*;

/// ∫_1^1000 sin(x)/x dx
const SINC_REFERENCE: f64 = 0.624_150_051_601_599_8;

fn sinc(x: f64) -> f64 {
    x.sin() / x
}

#[test]
fn test_simpson_sinc() {
    let result = simpson_integration(sinc, 1.0, 1000.0, 4000).unwrap();
    assert_abs_diff_eq!(result, SINC_REFERENCE, epsilon = 1e-5);
}

#[test]
fn test_fixed_step_rules_converge() {
    let mut prev_trapezoid = f64::INFINITY;
    let mut prev_simpson = f64::INFINITY;
    for n in [1000, 2000, 4000, 8000] {
        let t = trapezoid_integration(sinc, 1.0, 1000.0, n).unwrap();
        let s = simpson_integration(sinc, 1.0, 1000.0, n).unwrap();
        let t_err = (t - SINC_REFERENCE).abs();
        let s_err = (s - SINC_REFERENCE).abs();
        assert!(t_err < prev_trapezoid, "trapezoid error grew at N = {n}");
        assert!(s_err < prev_simpson, "Simpson error grew at N = {n}");
        prev_trapezoid = t_err;
        prev_simpson = s_err;
    }
    assert!(prev_simpson < 1e-6);
    assert!(prev_trapezoid < 1e-3);

    let sum = sum_integration(|x: f64| x.exp(), 0.0, 1.0, 100_000).unwrap();
    assert_abs_diff_eq!(sum, 1f64.exp() - 1.0, epsilon = 1e-4);
}

#[test]
fn test_exact_polynomials() {
    // Simpson is exact for cubics.
    let cubic = |x: f64| 4.0 * x * x * x - 3.0 * x * x + 1.0;
    let s = simpson_integration(cubic, -1.0, 2.0, 2).unwrap();
    assert_relative_eq!(s, 15.0 - 9.0 + 3.0, max_relative = 1e-12);

    // 16-point Gauss–Legendre is exact well beyond that.
    let p = |x: f64| x.powi(9) + x.powi(4);
    let g = gauss_legendre_integration(p, 0.0, 2.0).unwrap();
    assert_relative_eq!(g, 2f64.powi(10) / 10.0 + 2f64.powi(5) / 5.0, max_relative = 1e-12);
}

#[test]
fn test_vector_integrand() {
    let f = |x: f64| Vector3::new(x, 2.0 * x, 1.0);
    let v = trapezoid_integration(f, 0.0, 1.0, 10).unwrap();
    assert_abs_diff_eq!(v.x, 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(v.y, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(v.z, 1.0, epsilon = 1e-12);
}

#[test]
fn test_zero_length_interval_does_not_evaluate() {
    let calls = Cell::new(0);
    let f = |x: f64| {
        calls.set(calls.get() + 1);
        x
    };
    assert_eq!(sum_integration(f, 3.0, 3.0, 10).unwrap(), 0.0);
    assert_eq!(trapezoid_integration(f, 3.0, 3.0, 10).unwrap(), 0.0);
    assert_eq!(simpson_integration(f, 3.0, 3.0, 10).unwrap(), 0.0);
    assert_eq!(gauss_legendre_integration(f, 3.0, 3.0).unwrap(), 0.0);
    assert_eq!(qag(f, 3.0, 3.0, 1e-4, 10).unwrap(), 0.0);
    assert_eq!(adaptive_simpson(f, 3.0, 3.0, 1e-6, 10).unwrap(), 0.0);
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_bad_step_counts() {
    assert_eq!(
        sum_integration(sinc, 1.0, 2.0, 0),
        Err(QuadratureError::ZeroSteps)
    );
    assert_eq!(
        trapezoid_integration(sinc, 1.0, 2.0, 0),
        Err(QuadratureError::ZeroSteps)
    );
    assert_eq!(
        simpson_integration(sinc, 1.0, 2.0, 7),
        Err(QuadratureError::OddSimpsonSteps(7))
    );
    assert!(matches!(
        simpson_integration(sinc, 1.0, f64::INFINITY, 8),
        Err(QuadratureError::NonFiniteBounds { .. })
    ));
}

#[test]
fn test_reversed_bounds() {
    let forward = simpson_integration(sinc, 1.0, 10.0, 100).unwrap();
    let backward = simpson_integration(sinc, 10.0, 1.0, 100).unwrap();
    assert_relative_eq!(forward, -backward, max_relative = 1e-12);

    let forward = qag(sinc, 1.0, 10.0, 1e-8, 100).unwrap();
    let backward = qag(sinc, 10.0, 1.0, 1e-8, 100).unwrap();
    assert_relative_eq!(forward, -backward, max_relative = 1e-10);
}

#[test]
fn test_qag() {
    let result = qag(sinc, 1.0, 1000.0, 1e-4, 1000).unwrap();
    assert_relative_eq!(result, SINC_REFERENCE, max_relative = 1e-4);

    // A peaked integrand.
    let lorentz = |x: f64| 1e-3 / (x * x + 1e-6);
    let result = qag(lorentz, -1.0, 1.0, 1e-6, 1000).unwrap();
    let expected = 2.0 * (1e3f64).atan();
    assert_relative_eq!(result, expected, max_relative = 1e-5);

    // Zero integrand converges immediately.
    assert_eq!(qag(|_| 0.0, 0.0, 1.0, 1e-4, 1).unwrap(), 0.0);
}

#[test]
fn test_qag_non_convergence_is_recoverable() {
    let result = qag(sinc, 1.0, 1000.0, 1e-10, 1);
    match result {
        Err(QuadratureError::NoConvergence {
            lower,
            upper,
            limit,
            ..
        }) => {
            assert_abs_diff_eq!(lower, 1.0);
            assert_abs_diff_eq!(upper, 1000.0);
            assert_eq!(limit, 1);
        }
        other => panic!("expected non-convergence, got {other:?}"),
    }

    assert!(matches!(
        qag(|x: f64| 1.0 / x, -1.0, 1.0, 1e-4, 100),
        Err(QuadratureError::NonFinite { .. })
    ));
}

#[test]
fn test_adaptive_simpson() {
    let result = adaptive_simpson(f64::sin, 0.0, PI, 1e-10, 50).unwrap();
    assert_abs_diff_eq!(result, 2.0, epsilon = 1e-8);

    assert!(matches!(
        adaptive_simpson(sinc, 1.0, 1000.0, 1e-12, 2),
        Err(QuadratureError::NoConvergence { limit: 2, .. })
    ));
}

#[test]
fn test_rule_parsing() {
    assert_eq!(
        "simpson:300".parse::<QuadratureRule>().unwrap(),
        QuadratureRule::Simpson { steps: 300 }
    );
    assert_eq!(
        " QAG ".parse::<QuadratureRule>().unwrap(),
        QuadratureRule::default_qag()
    );
    assert_eq!(
        "qag:1e-5:500".parse::<QuadratureRule>().unwrap(),
        QuadratureRule::Qag {
            rel_tolerance: 1e-5,
            limit: 500
        }
    );
    assert_eq!(
        "gauss-legendre".parse::<QuadratureRule>().unwrap(),
        QuadratureRule::GaussLegendre
    );
    assert!("bogus:3".parse::<QuadratureRule>().is_err());
    assert!("simpson:many".parse::<QuadratureRule>().is_err());

    for rule in [
        QuadratureRule::Sum { steps: 10 },
        QuadratureRule::Trapezoid { steps: 20 },
        QuadratureRule::Simpson { steps: 30 },
        QuadratureRule::GaussLegendre,
        QuadratureRule::AdaptiveSimpson {
            tolerance: 1e-7,
            max_depth: 20,
        },
        QuadratureRule::default_qag(),
    ] {
        assert_eq!(rule.to_string().parse::<QuadratureRule>().unwrap(), rule);
    }
}

#[test]
fn test_rules_agree() {
    let f = |x: f64| (-x / 3.0).exp() * (1.0 + x.sin().powi(2));
    let rules = [
        QuadratureRule::Trapezoid { steps: 20_000 },
        QuadratureRule::Simpson { steps: 500 },
        QuadratureRule::AdaptiveSimpson {
            tolerance: 1e-10,
            max_depth: 40,
        },
        QuadratureRule::default_qag(),
    ];
    let reference = QuadratureRule::Qag {
        rel_tolerance: 1e-10,
        limit: 1000,
    }
    .integrate(f, 0.0, 20.0)
    .unwrap();
    for rule in rules {
        let v = rule.integrate(f, 0.0, 20.0).unwrap();
        assert_relative_eq!(v, reference, max_relative = 1e-4);
    }
}
