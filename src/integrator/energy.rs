// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integrals over the energy axis of a spectrum.
//!
//! A geometric axis is integrated in log space, `Σ f(E) E ln(s)`. Anything
//! else is a sum over neighbouring energies weighted by their difference.

use std::sync::Arc;

use crate::{
    constants::C_LIGHT,
    coord::Position,
    models::{CosmicRayDensity, DifferentialCrossSection, EnergyAxis},
};

/// `∫ f(E) dE` over the energies of `axis` from index `start` onwards.
pub(crate) fn integrate_over_energy_axis<F>(axis: &EnergyAxis, start: usize, f: F) -> f64
where
    F: Fn(f64) -> f64,
{
    integrate_over_energy_axis_indexed(axis, start, |_, e| f(e))
}

/// Like [`integrate_over_energy_axis`], but `f` also gets the index of each
/// energy on the axis.
pub(crate) fn integrate_over_energy_axis_indexed<F>(axis: &EnergyAxis, start: usize, f: F) -> f64
where
    F: Fn(usize, f64) -> f64,
{
    let energies = axis.energies();
    match axis.scale_factor() {
        Some(scale_factor) => integrate_over_log_energy(energies, start, scale_factor, f),
        None => integrate_over_sum_energy(energies, start, f),
    }
}

/// `Σ f(E_i) (E_i - E_{i-1})`, starting from the second energy at the
/// earliest.
fn integrate_over_sum_energy<F>(energies: &[f64], start: usize, f: F) -> f64
where
    F: Fn(usize, f64) -> f64,
{
    energies
        .windows(2)
        .enumerate()
        .skip(start.saturating_sub(1))
        .map(|(i, w)| f(i + 1, w[1]) * (w[1] - w[0]))
        .sum()
}

/// `Σ f(E_i) E_i ln(s)`.
fn integrate_over_log_energy<F>(energies: &[f64], start: usize, scale_factor: f64, f: F) -> f64
where
    F: Fn(usize, f64) -> f64,
{
    energies
        .iter()
        .enumerate()
        .skip(start)
        .map(|(i, &e)| f(i, e) * e)
        .sum::<f64>()
        * scale_factor.ln()
}

/// Gamma-ray emissivity per target atom from projectiles of every species in
/// `projectiles` colliding with the gas \[s^-1 J^-1\] at photon energy
/// `e_gamma`: `Σ ∫_{E ≥ E_γ} n(E) c dσ/dE_γ(E, E_γ) dE`.
pub(crate) fn two_body_emissivity(
    projectiles: &[Arc<dyn CosmicRayDensity>],
    cross_section: &dyn DifferentialCrossSection,
    pos: &Position,
    e_gamma: f64,
) -> f64 {
    projectiles
        .iter()
        .map(|species| {
            let axis = species.energy_axis();
            let start = axis.first_index_at_or_above(e_gamma);
            integrate_over_energy_axis(axis, start, |e| {
                species.density_per_energy(e, pos)
                    * C_LIGHT
                    * cross_section.diff_cross_section(e, e_gamma)
            })
        })
        .sum()
}
