// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{check_positive, EnergyAxis, ModelError, PhotonField};
use crate::{constants::*, coord::Position};

/// A diluted blackbody, the same everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct BlackbodyPhotonField {
    axis: EnergyAxis,

    /// \[K\]
    temperature: f64,

    dilution: f64,

    /// `ε² dn/dε` for each energy of the axis \[J m^-3\].
    energy_densities: Vec<f64>,
}

impl BlackbodyPhotonField {
    pub fn new(
        temperature: f64,
        dilution: f64,
        axis: EnergyAxis,
    ) -> Result<BlackbodyPhotonField, ModelError> {
        let temperature = check_positive("temperature", temperature)?;
        let dilution = check_positive("dilution", dilution)?;
        let energy_densities = axis
            .energies()
            .iter()
            .map(|&e| dilution * e * e * blackbody_number_density(e, temperature))
            .collect();
        Ok(BlackbodyPhotonField {
            axis,
            temperature,
            dilution,
            energy_densities,
        })
    }

    /// The cosmic microwave background, 2.725 K, tabulated from 10^-6 eV to
    /// 10^-2 eV.
    pub fn cmb() -> BlackbodyPhotonField {
        let axis = EnergyAxis::geometric_with_steps(1e-6 * EV, 1e-2 * EV, 100)
            .expect("constant CMB axis is valid");
        BlackbodyPhotonField::new(CMB_TEMPERATURE, 1.0, axis).expect("constant CMB parameters are valid")
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn dilution(&self) -> f64 {
        self.dilution
    }
}

/// Photon number density per unit energy of a blackbody \[m^-3 J^-1\].
pub(crate) fn blackbody_number_density(energy: f64, temperature: f64) -> f64 {
    let hc = H_PLANCK * C_LIGHT;
    8.0 * PI / (hc * hc * hc) * energy * energy / (energy / (K_BOLTZMANN * temperature)).exp_m1()
}

impl PhotonField for BlackbodyPhotonField {
    fn energy_axis(&self) -> &EnergyAxis {
        &self.axis
    }

    fn energy_density(&self, _: &Position, index: usize) -> f64 {
        self.energy_densities.get(index).copied().unwrap_or(0.0)
    }
}
