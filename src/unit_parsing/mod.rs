// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to parse strings into plain numbers or some quantity with a unit.
//!
//! Naked numbers are returned with a `NoUnit` format; callers decide what that
//! means (usually SI).

mod error;

pub(crate) use error::*;

use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, EnumIter, EnumString, IntoStaticStr)]
#[allow(non_camel_case_types)]
pub(crate) enum LengthFormat {
    /// Kiloparsecs
    kpc,

    /// Parsecs
    pc,

    /// Metres
    m,

    NoUnit,
}

impl LengthFormat {
    /// Convert a value in this unit into metres.
    pub(crate) fn to_si(self, value: f64) -> f64 {
        match self {
            LengthFormat::kpc => value * KPC,
            LengthFormat::pc => value * PC,
            LengthFormat::m | LengthFormat::NoUnit => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, EnumIter, EnumString, IntoStaticStr)]
#[allow(non_camel_case_types)]
pub(crate) enum FreqFormat {
    /// GigaHertz
    GHz,

    /// MegaHertz
    MHz,

    /// kiloHertz
    kHz,

    /// Hertz
    Hz,

    NoUnit,
}

impl FreqFormat {
    /// Convert a value in this unit into Hz.
    pub(crate) fn to_si(self, value: f64) -> f64 {
        match self {
            FreqFormat::GHz => value * GHZ,
            FreqFormat::MHz => value * MHZ,
            FreqFormat::kHz => value * KHZ,
            FreqFormat::Hz | FreqFormat::NoUnit => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, EnumIter, EnumString, IntoStaticStr)]
pub(crate) enum EnergyFormat {
    TeV,
    GeV,
    MeV,
    KeV,
    #[strum(serialize = "eV")]
    EV,

    /// Joules
    J,

    NoUnit,
}

impl EnergyFormat {
    /// Convert a value in this unit into J.
    pub(crate) fn to_si(self, value: f64) -> f64 {
        match self {
            EnergyFormat::TeV => value * TEV,
            EnergyFormat::GeV => value * GEV,
            EnergyFormat::MeV => value * MEV,
            EnergyFormat::KeV => value * KEV,
            EnergyFormat::EV => value * EV,
            EnergyFormat::J | EnergyFormat::NoUnit => value,
        }
    }
}

/// Split `s` into a number and one of the unit strings supplied by `units`.
/// Units are tried in order; the first unit that the string ends with *and*
/// leaves a parsable number wins, so longer units sharing a suffix with shorter
/// ones (e.g. "kpc" and "pc") must come first.
fn split_number_and_unit<U>(s: &str) -> Option<Result<(f64, U), &'static str>>
where
    U: IntoEnumIterator + Into<&'static str> + Copy,
{
    let trimmed = s.trim();
    let mut matched_unit = None;
    for format in U::iter() {
        let format_str: &'static str = format.into();
        if format_str == "NoUnit" {
            continue;
        }
        let split = match trimmed.len().checked_sub(format_str.len()) {
            Some(i) if trimmed.is_char_boundary(i) => i,
            _ => continue,
        };
        if !trimmed[split..].eq_ignore_ascii_case(format_str) {
            continue;
        }
        let prefix = trimmed[..split].trim();
        match prefix.parse::<f64>() {
            Ok(number) => return Some(Ok((number, format))),
            Err(_) => {
                if matched_unit.is_none() {
                    matched_unit = Some(format_str);
                }
            }
        }
    }
    matched_unit.map(Err)
}

/// Parse a string that may have a unit of length attached to it.
pub(crate) fn parse_length(s: &str) -> Result<(f64, LengthFormat), UnitParseError> {
    // Try to parse a naked number.
    let maybe_number: Option<f64> = s.trim().parse().ok();
    if let Some(number) = maybe_number {
        return Ok((number, LengthFormat::NoUnit));
    };

    match split_number_and_unit(s) {
        Some(Ok(pair)) => Ok(pair),
        Some(Err(unit)) => Err(UnitParseError::GotUnitButCantParse {
            input: s.to_string(),
            unit,
        }),
        None => Err(UnitParseError::Unknown {
            input: s.to_string(),
            unit_type: "length",
        }),
    }
}

/// Parse a string that may have a unit of frequency attached to it.
pub(crate) fn parse_freq(s: &str) -> Result<(f64, FreqFormat), UnitParseError> {
    let maybe_number: Option<f64> = s.trim().parse().ok();
    if let Some(number) = maybe_number {
        return Ok((number, FreqFormat::NoUnit));
    };

    match split_number_and_unit(s) {
        Some(Ok(pair)) => Ok(pair),
        Some(Err(unit)) => Err(UnitParseError::GotUnitButCantParse {
            input: s.to_string(),
            unit,
        }),
        None => Err(UnitParseError::Unknown {
            input: s.to_string(),
            unit_type: "frequency",
        }),
    }
}

/// Parse a string that may have a unit of energy attached to it.
pub(crate) fn parse_energy(s: &str) -> Result<(f64, EnergyFormat), UnitParseError> {
    let maybe_number: Option<f64> = s.trim().parse().ok();
    if let Some(number) = maybe_number {
        return Ok((number, EnergyFormat::NoUnit));
    };

    match split_number_and_unit(s) {
        Some(Ok(pair)) => Ok(pair),
        Some(Err(unit)) => Err(UnitParseError::GotUnitButCantParse {
            input: s.to_string(),
            unit,
        }),
        None => Err(UnitParseError::Unknown {
            input: s.to_string(),
            unit_type: "energy",
        }),
    }
}

/// Parse a length and convert it to metres.
pub(crate) fn parse_length_si(s: &str) -> Result<f64, UnitParseError> {
    parse_length(s).map(|(v, f)| f.to_si(v))
}

/// Parse a frequency and convert it to Hz.
pub(crate) fn parse_freq_si(s: &str) -> Result<f64, UnitParseError> {
    parse_freq(s).map(|(v, f)| f.to_si(v))
}

/// Parse an energy and convert it to J.
pub(crate) fn parse_energy_si(s: &str) -> Result<f64, UnitParseError> {
    parse_energy(s).map(|(v, f)| f.to_si(v))
}
