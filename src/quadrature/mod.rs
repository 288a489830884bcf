// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Numerical integration of one-dimensional integrands.
//!
//! The fixed-step rules are generic over the integrand's output, so a scalar
//! emissivity and a vector-valued field integrate through the same code. The
//! adaptive rules work on `f64` only, as they need error estimates.
//!
//! Every rule integrates over `[lower, upper]`. A zero-length interval gives
//! zero without evaluating the integrand, and reversed bounds give the negated
//! integral.

mod adaptive;
mod error;
#[cfg(test)]
mod tests;

pub use adaptive::{adaptive_simpson, qag};
pub use error::QuadratureError;

use std::{fmt, ops::Add, ops::Mul, str::FromStr};

use itertools::Itertools;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::constants::{DEFAULT_QAG_LIMIT, DEFAULT_QAG_REL_TOLERANCE};

lazy_static::lazy_static! {
    pub(crate) static ref QUADRATURE_RULES_COMMA_SEPARATED: String = QuadratureRuleKind::iter().join(", ");
}

/// Anything that can be accumulated by the fixed-step rules.
pub trait Integrand: Copy + Zero + Add<Output = Self> + Mul<f64, Output = Self> {}

impl<T> Integrand for T where T: Copy + Zero + Add<Output = T> + Mul<f64, Output = T> {}

fn check_bounds(lower: f64, upper: f64) -> Result<(), QuadratureError> {
    if lower.is_finite() && upper.is_finite() {
        Ok(())
    } else {
        Err(QuadratureError::NonFiniteBounds { lower, upper })
    }
}

/// Rectangle rule: `steps` equal-width cells, each weighted by the integrand at
/// its left edge.
pub fn sum_integration<T, F>(f: F, lower: f64, upper: f64, steps: usize) -> Result<T, QuadratureError>
where
    T: Integrand,
    F: Fn(f64) -> T,
{
    if steps == 0 {
        return Err(QuadratureError::ZeroSteps);
    }
    check_bounds(lower, upper)?;
    if lower == upper {
        return Ok(T::zero());
    }

    let dx = (upper - lower) / steps as f64;
    let total = (0..steps).fold(T::zero(), |acc, i| acc + f(lower + i as f64 * dx));
    Ok(total * dx)
}

/// Composite trapezoid rule with `steps` equal-width cells.
pub fn trapezoid_integration<T, F>(
    f: F,
    lower: f64,
    upper: f64,
    steps: usize,
) -> Result<T, QuadratureError>
where
    T: Integrand,
    F: Fn(f64) -> T,
{
    if steps == 0 {
        return Err(QuadratureError::ZeroSteps);
    }
    check_bounds(lower, upper)?;
    if lower == upper {
        return Ok(T::zero());
    }

    let dx = (upper - lower) / steps as f64;
    let ends = (f(lower) + f(upper)) * 0.5;
    let interior = (1..steps).fold(T::zero(), |acc, i| acc + f(lower + i as f64 * dx));
    Ok((ends + interior) * dx)
}

/// Composite Simpson's rule. `steps` must be even.
pub fn simpson_integration<T, F>(
    f: F,
    lower: f64,
    upper: f64,
    steps: usize,
) -> Result<T, QuadratureError>
where
    T: Integrand,
    F: Fn(f64) -> T,
{
    if steps == 0 {
        return Err(QuadratureError::ZeroSteps);
    }
    if steps % 2 != 0 {
        return Err(QuadratureError::OddSimpsonSteps(steps));
    }
    check_bounds(lower, upper)?;
    if lower == upper {
        return Ok(T::zero());
    }

    let h = (upper - lower) / steps as f64;
    let mut odd = T::zero();
    let mut even = T::zero();
    for i in 1..steps {
        let v = f(lower + i as f64 * h);
        if i % 2 == 0 {
            even = even + v;
        } else {
            odd = odd + v;
        }
    }
    Ok((f(lower) + f(upper) + even * 2.0 + odd * 4.0) * (h / 3.0))
}

/// Positive abscissae of the 16-point Gauss–Legendre rule on [-1, 1].
const GL16_NODES: [f64; 8] = [
    0.095_012_509_837_637_44,
    0.281_603_550_779_258_9,
    0.458_016_777_657_227_4,
    0.617_876_244_402_643_8,
    0.755_404_408_355_003,
    0.865_631_202_387_831_8,
    0.944_575_023_073_232_6,
    0.989_400_934_991_649_9,
];
const GL16_WEIGHTS: [f64; 8] = [
    0.189_450_610_455_068_5,
    0.182_603_415_044_923_6,
    0.169_156_519_395_002_5,
    0.149_595_988_816_576_7,
    0.124_628_971_255_533_9,
    0.095_158_511_682_492_78,
    0.062_253_523_938_647_89,
    0.027_152_459_411_754_09,
];

/// Single-panel 16-point Gauss–Legendre quadrature. Cheap and exact for
/// polynomials up to degree 31, but has no error control.
pub fn gauss_legendre_integration<T, F>(f: F, lower: f64, upper: f64) -> Result<T, QuadratureError>
where
    T: Integrand,
    F: Fn(f64) -> T,
{
    check_bounds(lower, upper)?;
    if lower == upper {
        return Ok(T::zero());
    }

    let mid = 0.5 * (upper + lower);
    let half = 0.5 * (upper - lower);
    let total = GL16_NODES
        .iter()
        .zip(GL16_WEIGHTS.iter())
        .fold(T::zero(), |acc, (&x, &w)| {
            let dx = half * x;
            acc + (f(mid - dx) + f(mid + dx)) * w
        });
    Ok(total * half)
}

/// The names of the available rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum QuadratureRuleKind {
    Sum,
    Trapezoid,
    Simpson,
    GaussLegendre,
    AdaptiveSimpson,
    Qag,
}

/// A quadrature rule and its settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum QuadratureRule {
    Sum { steps: usize },
    Trapezoid { steps: usize },
    Simpson { steps: usize },
    GaussLegendre,
    AdaptiveSimpson { tolerance: f64, max_depth: u32 },
    Qag { rel_tolerance: f64, limit: usize },
}

impl QuadratureRule {
    /// Adaptive Gauss–Kronrod with the default tolerance and workspace limit.
    pub fn default_qag() -> QuadratureRule {
        QuadratureRule::Qag {
            rel_tolerance: DEFAULT_QAG_REL_TOLERANCE,
            limit: DEFAULT_QAG_LIMIT,
        }
    }

    pub fn kind(&self) -> QuadratureRuleKind {
        match self {
            QuadratureRule::Sum { .. } => QuadratureRuleKind::Sum,
            QuadratureRule::Trapezoid { .. } => QuadratureRuleKind::Trapezoid,
            QuadratureRule::Simpson { .. } => QuadratureRuleKind::Simpson,
            QuadratureRule::GaussLegendre => QuadratureRuleKind::GaussLegendre,
            QuadratureRule::AdaptiveSimpson { .. } => QuadratureRuleKind::AdaptiveSimpson,
            QuadratureRule::Qag { .. } => QuadratureRuleKind::Qag,
        }
    }

    /// Integrate `f` over `[lower, upper]` with this rule.
    pub fn integrate<F>(&self, f: F, lower: f64, upper: f64) -> Result<f64, QuadratureError>
    where
        F: Fn(f64) -> f64,
    {
        match *self {
            QuadratureRule::Sum { steps } => sum_integration(f, lower, upper, steps),
            QuadratureRule::Trapezoid { steps } => trapezoid_integration(f, lower, upper, steps),
            QuadratureRule::Simpson { steps } => simpson_integration(f, lower, upper, steps),
            QuadratureRule::GaussLegendre => gauss_legendre_integration(f, lower, upper),
            QuadratureRule::AdaptiveSimpson {
                tolerance,
                max_depth,
            } => adaptive_simpson(f, lower, upper, tolerance, max_depth),
            QuadratureRule::Qag {
                rel_tolerance,
                limit,
            } => qag(f, lower, upper, rel_tolerance, limit),
        }
    }
}

impl fmt::Display for QuadratureRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuadratureRule::Sum { steps }
            | QuadratureRule::Trapezoid { steps }
            | QuadratureRule::Simpson { steps } => write!(f, "{}:{steps}", self.kind()),
            QuadratureRule::GaussLegendre => write!(f, "{}", self.kind()),
            QuadratureRule::AdaptiveSimpson {
                tolerance,
                max_depth,
            } => write!(f, "{}:{tolerance:e}:{max_depth}", self.kind()),
            QuadratureRule::Qag {
                rel_tolerance,
                limit,
            } => write!(f, "{}:{rel_tolerance:e}:{limit}", self.kind()),
        }
    }
}

/// Parse a rule written like "simpson:300", "qag" or "qag:1e-5:500". Omitted
/// settings take sensible defaults.
impl FromStr for QuadratureRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(':').map(str::trim);
        let name = parts.next().unwrap_or_default();
        let kind = QuadratureRuleKind::from_str(&name.to_lowercase()).map_err(|_| {
            format!(
                "Unknown quadrature rule '{name}'; supported rules are: {}",
                *QUADRATURE_RULES_COMMA_SEPARATED
            )
        })?;
        let settings: Vec<&str> = parts.collect();

        fn setting<T: FromStr>(settings: &[&str], i: usize, default: T) -> Result<T, String> {
            match settings.get(i) {
                None => Ok(default),
                Some(s) => s
                    .parse()
                    .map_err(|_| format!("Couldn't parse quadrature setting '{s}'")),
            }
        }

        let rule = match kind {
            QuadratureRuleKind::Sum => QuadratureRule::Sum {
                steps: setting(&settings, 0, 1000)?,
            },
            QuadratureRuleKind::Trapezoid => QuadratureRule::Trapezoid {
                steps: setting(&settings, 0, 500)?,
            },
            QuadratureRuleKind::Simpson => QuadratureRule::Simpson {
                steps: setting(&settings, 0, 300)?,
            },
            QuadratureRuleKind::GaussLegendre => QuadratureRule::GaussLegendre,
            QuadratureRuleKind::AdaptiveSimpson => QuadratureRule::AdaptiveSimpson {
                tolerance: setting(&settings, 0, 1e-6)?,
                max_depth: setting(&settings, 1, 30)?,
            },
            QuadratureRuleKind::Qag => QuadratureRule::Qag {
                rel_tolerance: setting(&settings, 0, DEFAULT_QAG_REL_TOLERANCE)?,
                limit: setting(&settings, 1, DEFAULT_QAG_LIMIT)?,
            },
        };
        Ok(rule)
    }
}
