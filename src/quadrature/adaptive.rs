// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Adaptive quadrature.
//!
//! [`qag`] follows QUADPACK's QAG with the 21-point Gauss–Kronrod pair: the
//! interval with the largest error estimate is bisected until the summed error
//! estimate meets the relative tolerance. Unlike the C library, failure to
//! converge is an ordinary error carrying the interval, never an abort.

use super::{check_bounds, QuadratureError};

/// Kronrod abscissae on [0, 1]. Odd indices are also the 10-point Gauss
/// abscissae.
const XGK: [f64; 11] = [
    0.995_657_163_025_808_1,
    0.973_906_528_517_171_7,
    0.930_157_491_355_708_2,
    0.865_063_366_688_984_5,
    0.780_817_726_586_416_9,
    0.679_409_568_299_024_4,
    0.562_757_134_668_604_7,
    0.433_395_394_129_247_2,
    0.294_392_862_701_460_2,
    0.148_874_338_981_631_2,
    0.0,
];

const WGK: [f64; 11] = [
    0.011_694_638_867_371_874,
    0.032_558_162_307_964_73,
    0.054_755_896_574_351_996,
    0.075_039_674_810_919_95,
    0.093_125_454_583_697_6,
    0.109_387_158_802_297_64,
    0.123_491_976_262_065_85,
    0.134_709_217_311_473_33,
    0.142_775_938_577_060_08,
    0.147_739_104_901_338_5,
    0.149_445_554_002_916_9,
];

const WG: [f64; 5] = [
    0.066_671_344_308_688_14,
    0.149_451_349_150_580_6,
    0.219_086_362_515_982_04,
    0.269_266_719_309_996_35,
    0.295_524_224_714_752_87,
];

#[derive(Debug, Clone, Copy)]
struct Segment {
    lower: f64,
    upper: f64,
    result: f64,
    error: f64,
}

/// 21-point Gauss–Kronrod estimate over one segment.
fn qk21<F>(f: &F, lower: f64, upper: f64) -> Result<Segment, QuadratureError>
where
    F: Fn(f64) -> f64,
{
    let eval = |x: f64| -> Result<f64, QuadratureError> {
        let v = f(x);
        if v.is_finite() {
            Ok(v)
        } else {
            Err(QuadratureError::NonFinite { x })
        }
    };

    let centre = 0.5 * (lower + upper);
    let half = 0.5 * (upper - lower);
    let abs_half = half.abs();

    let fc = eval(centre)?;
    let mut result_gauss = 0.0;
    let mut result_kronrod = fc * WGK[10];
    let mut result_abs = result_kronrod.abs();
    let mut fv1 = [0.0; 10];
    let mut fv2 = [0.0; 10];

    for j in 0..5 {
        let jtw = 2 * j + 1;
        let abscissa = half * XGK[jtw];
        let f1 = eval(centre - abscissa)?;
        let f2 = eval(centre + abscissa)?;
        fv1[jtw] = f1;
        fv2[jtw] = f2;
        let fsum = f1 + f2;
        result_gauss += WG[j] * fsum;
        result_kronrod += WGK[jtw] * fsum;
        result_abs += WGK[jtw] * (f1.abs() + f2.abs());
    }
    for j in 0..5 {
        let jtwm1 = 2 * j;
        let abscissa = half * XGK[jtwm1];
        let f1 = eval(centre - abscissa)?;
        let f2 = eval(centre + abscissa)?;
        fv1[jtwm1] = f1;
        fv2[jtwm1] = f2;
        result_kronrod += WGK[jtwm1] * (f1 + f2);
        result_abs += WGK[jtwm1] * (f1.abs() + f2.abs());
    }

    let mean = result_kronrod * 0.5;
    let mut result_asc = WGK[10] * (fc - mean).abs();
    for j in 0..10 {
        result_asc += WGK[j] * ((fv1[j] - mean).abs() + (fv2[j] - mean).abs());
    }

    let result = result_kronrod * half;
    result_abs *= abs_half;
    result_asc *= abs_half;
    let mut error = ((result_kronrod - result_gauss) * half).abs();
    if result_asc != 0.0 && error != 0.0 {
        error = result_asc * (200.0 * error / result_asc).powf(1.5).min(1.0);
    }
    if result_abs > f64::MIN_POSITIVE / (50.0 * f64::EPSILON) {
        error = error.max(50.0 * f64::EPSILON * result_abs);
    }

    Ok(Segment {
        lower,
        upper,
        result,
        error,
    })
}

/// Adaptive 21-point Gauss–Kronrod quadrature with a relative error target.
/// At most `limit` segments are used.
pub fn qag<F>(
    f: F,
    lower: f64,
    upper: f64,
    rel_tolerance: f64,
    limit: usize,
) -> Result<f64, QuadratureError>
where
    F: Fn(f64) -> f64,
{
    if limit == 0 {
        return Err(QuadratureError::ZeroSteps);
    }
    check_bounds(lower, upper)?;
    if lower == upper {
        return Ok(0.0);
    }

    let first = qk21(&f, lower, upper)?;
    let mut segments = Vec::with_capacity(limit.min(64));
    segments.push(first);
    let mut result = first.result;
    let mut error = first.error;

    loop {
        if error <= rel_tolerance * result.abs() {
            return Ok(result);
        }
        if segments.len() >= limit {
            break;
        }

        // Bisect the segment with the largest error.
        let (i_worst, worst) = segments
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.error.total_cmp(&b.error))
            .expect("there is always at least one segment");
        let mid = 0.5 * (worst.lower + worst.upper);
        // Too narrow to split any further.
        if mid <= worst.lower.min(worst.upper) || mid >= worst.lower.max(worst.upper) {
            break;
        }
        let left = qk21(&f, worst.lower, mid)?;
        let right = qk21(&f, mid, worst.upper)?;

        result += left.result + right.result - worst.result;
        error += left.error + right.error - worst.error;
        segments[i_worst] = left;
        segments.push(right);
    }

    // Re-sum to shed accumulated round-off before judging the final state.
    let result: f64 = segments.iter().map(|s| s.result).sum();
    let error: f64 = segments.iter().map(|s| s.error).sum();
    if error <= rel_tolerance * result.abs() {
        Ok(result)
    } else {
        Err(QuadratureError::NoConvergence {
            lower,
            upper,
            estimate: result,
            error_estimate: error,
            limit,
        })
    }
}

/// Adaptive Simpson's rule with an absolute `tolerance`. Each branch may be
/// bisected at most `max_depth` times.
pub fn adaptive_simpson<F>(
    f: F,
    lower: f64,
    upper: f64,
    tolerance: f64,
    max_depth: u32,
) -> Result<f64, QuadratureError>
where
    F: Fn(f64) -> f64,
{
    check_bounds(lower, upper)?;
    if lower == upper {
        return Ok(0.0);
    }

    let mid = 0.5 * (lower + upper);
    let mut ends = [0.0; 3];
    for (v, x) in ends.iter_mut().zip([lower, mid, upper]) {
        *v = f(x);
        if !v.is_finite() {
            return Err(QuadratureError::NonFinite { x });
        }
    }
    let [fa, fm, fb] = ends;
    let whole = (upper - lower) / 6.0 * (fa + 4.0 * fm + fb);
    simpson_step(&f, lower, upper, fa, fm, fb, whole, tolerance, max_depth).map_err(|e| match e {
        QuadratureError::NoConvergence {
            lower,
            upper,
            estimate,
            error_estimate,
            ..
        } => QuadratureError::NoConvergence {
            lower,
            upper,
            estimate,
            error_estimate,
            limit: max_depth as usize,
        },
        e => e,
    })
}

#[allow(clippy::too_many_arguments)]
fn simpson_step<F>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tolerance: f64,
    depth: u32,
) -> Result<f64, QuadratureError>
where
    F: Fn(f64) -> f64,
{
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);
    if !flm.is_finite() {
        return Err(QuadratureError::NonFinite { x: lm });
    }
    if !frm.is_finite() {
        return Err(QuadratureError::NonFinite { x: rm });
    }
    let left = (m - a) / 6.0 * (fa + 4.0 * flm + fm);
    let right = (b - m) / 6.0 * (fm + 4.0 * frm + fb);
    let delta = left + right - whole;

    if delta.abs() <= 15.0 * tolerance {
        return Ok(left + right + delta / 15.0);
    }
    if depth == 0 {
        return Err(QuadratureError::NoConvergence {
            lower: a,
            upper: b,
            estimate: left + right,
            error_estimate: delta.abs() / 15.0,
            limit: 0,
        });
    }
    Ok(
        simpson_step(f, a, m, fa, flm, fm, left, tolerance / 2.0, depth - 1)?
            + simpson_step(f, m, b, fm, frm, fb, right, tolerance / 2.0, depth - 1)?,
    )
}
