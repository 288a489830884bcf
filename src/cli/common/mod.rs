// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Common arguments for command-line interfaces. Every `skylos` subcommand
//! integrates a physical process through the Galaxy, so the arguments that
//! select the process and describe the Galaxy are shared between them.

mod printers;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use std::{str::FromStr, sync::Arc};

use clap::Parser;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;
use vec1::vec1;

use crate::{
    constants::*,
    coord::{default_observer, CoordError, GalacticBoundary, Position},
    integrator::{
        BremsstrahlungIntegrator, DarkMatterIntegrator, DispersionMeasureIntegrator,
        FreeFreeIntegrator, Integrator, IntegratorError, IntegratorKind, InverseComptonIntegrator,
        PiZeroAbsorptionIntegrator, PiZeroIntegrator, RotationMeasureIntegrator, SynchroAbsorptionIntegrator, SynchrotronIntegrator,
        INTEGRATOR_KINDS_COMMA_SEPARATED,
    },
    models::{
        BlackbodyPhotonField, BremsstrahlungCrossSection, CosmicRayDensity, EnergyAxis,
        ExponentialDisk, KleinNishina, ModelError, NfwProfile, PionDecayCrossSection,
        PowerLawCosmicRays, QuarkContinuumSpectrum, ToroidalField,
    },
    quadrature::{QuadratureRule, QUADRATURE_RULES_COMMA_SEPARATED},
    unit_parsing::{parse_energy_si, parse_freq_si, parse_length_si, UnitParseError},
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref PROCESS_HELP: String =
        format!("The physical process to integrate along each line of sight. Supported processes: {}", *INTEGRATOR_KINDS_COMMA_SEPARATED);

    static ref QUADRATURE_HELP: String =
        format!("The quadrature rule used along each line of sight, e.g. simpson:300 or qag:1e-5:500. Supported rules: {}. Default: the process's own rule", *QUADRATURE_RULES_COMMA_SEPARATED);

    static ref OBSERVER_HELP: String =
        format!("The observer's galactocentric position (x, y, z). Units may be given, e.g. 8kpc. Default: ({} kpc, 0, 0)", DEFAULT_OBSERVER_X / KPC);

    static ref BOUNDARY_RADIUS_HELP: String =
        format!("The radius of the sphere beyond which the Galaxy is empty. Default: {} kpc", DEFAULT_BOUNDARY_RADIUS / KPC);

    static ref BOUNDARY_HALF_HEIGHT_HELP: String =
        format!("The half-height of the Galactic disk, used to size cache tables. Default: {} kpc", DEFAULT_BOUNDARY_HALF_HEIGHT / KPC);

    static ref CACHE_GRID_HELP: String =
        format!("The number of cache table cells along x, y and z, for processes that use one. Default: {:?}", DEFAULT_CACHE_GRID);

    static ref ENERGY_STEPS_HELP: String =
        format!("The number of tabulated energies in cosmic-ray spectra. Default: {DEFAULT_ENERGY_STEPS}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(SkylosError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(SkylosError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(SkylosError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// Arguments that choose the process and describe the Galaxy it's integrated
/// through.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct IntegratorArgs {
    #[clap(short, long, help = PROCESS_HELP.as_str(), help_heading = "PROCESS")]
    pub(super) process: Option<String>,

    #[clap(long, help = QUADRATURE_HELP.as_str(), help_heading = "PROCESS")]
    pub(super) quadrature: Option<String>,

    #[clap(long, help = ENERGY_STEPS_HELP.as_str(), help_heading = "PROCESS")]
    pub(super) energy_steps: Option<usize>,

    #[clap(
        long, help = OBSERVER_HELP.as_str(), help_heading = "GALAXY",
        number_of_values = 3,
        allow_hyphen_values = true,
        value_names = &["X", "Y", "Z"]
    )]
    pub(super) observer: Option<Vec<String>>,

    #[clap(long, help = BOUNDARY_RADIUS_HELP.as_str(), help_heading = "GALAXY")]
    pub(super) boundary_radius: Option<String>,

    #[clap(long, help = BOUNDARY_HALF_HEIGHT_HELP.as_str(), help_heading = "GALAXY")]
    pub(super) boundary_half_height: Option<String>,

    #[clap(
        long, help = CACHE_GRID_HELP.as_str(), help_heading = "CACHE",
        number_of_values = 3,
        value_names = &["NX", "NY", "NZ"]
    )]
    pub(super) cache_grid: Option<Vec<usize>>,

    /// Integrate every point directly, even for processes that can use a
    /// cache table.
    #[clap(long, help_heading = "CACHE")]
    #[serde(default)]
    pub(super) no_cache: bool,
}

/// A ready-to-use integrator.
pub(super) struct IntegratorParams {
    pub(super) integrator: Box<dyn Integrator>,
    pub(super) kind: IntegratorKind,
}

impl IntegratorArgs {
    /// Prefer `self` (the command line) over `other` (an arguments file).
    pub(super) fn merge(self, other: IntegratorArgs) -> IntegratorArgs {
        IntegratorArgs {
            process: self.process.or(other.process),
            quadrature: self.quadrature.or(other.quadrature),
            energy_steps: self.energy_steps.or(other.energy_steps),
            observer: self.observer.or(other.observer),
            boundary_radius: self.boundary_radius.or(other.boundary_radius),
            boundary_half_height: self.boundary_half_height.or(other.boundary_half_height),
            cache_grid: self.cache_grid.or(other.cache_grid),
            no_cache: self.no_cache || other.no_cache,
        }
    }

    pub(super) fn parse(self) -> Result<IntegratorParams, IntegratorArgsError> {
        let IntegratorArgs {
            process,
            quadrature,
            energy_steps,
            observer,
            boundary_radius,
            boundary_half_height,
            cache_grid,
            no_cache,
        } = self;

        let kind = parse_process(process.as_deref())?;
        let rule = quadrature
            .as_deref()
            .map(QuadratureRule::from_str)
            .transpose()
            .map_err(IntegratorArgsError::Quadrature)?;
        let energy_steps = energy_steps.unwrap_or(DEFAULT_ENERGY_STEPS);

        let observer = match observer {
            None => default_observer(),
            Some(xyz) => {
                if xyz.len() != 3 {
                    return Err(IntegratorArgsError::ObserverLength(xyz.len()));
                }
                Position::new(
                    parse_length_si(&xyz[0])?,
                    parse_length_si(&xyz[1])?,
                    parse_length_si(&xyz[2])?,
                )
            }
        };
        let boundary = GalacticBoundary::new(
            boundary_radius
                .as_deref()
                .map(parse_length_si)
                .transpose()?
                .unwrap_or(DEFAULT_BOUNDARY_RADIUS),
            boundary_half_height
                .as_deref()
                .map(parse_length_si)
                .transpose()?
                .unwrap_or(DEFAULT_BOUNDARY_HALF_HEIGHT),
        )?;
        if observer.norm() > boundary.radius {
            return Err(CoordError::ObserverOutsideBoundary {
                distance: observer.norm(),
                radius: boundary.radius,
            }
            .into());
        }

        let mut integrator = build_integrator(kind, rule, energy_steps)?;
        integrator.set_galactic_boundary(boundary);
        integrator.set_observer_position(observer);

        let mut printer = InfoPrinter::new(format!("Integrating {kind}").into());
        printer.push_line(integrator.description().into());
        printer.push_block(vec![
            format!(
                "Observer at ({:.3}, {:.3}, {:.3}) kpc",
                observer.x / KPC,
                observer.y / KPC,
                observer.z / KPC
            )
            .into(),
            format!(
                "Boundary radius {:.3} kpc, half-height {:.3} kpc",
                boundary.radius / KPC,
                boundary.half_height / KPC
            )
            .into(),
        ]);

        if integrator.supports_cache() && !no_cache {
            let [nx, ny, nz] = match cache_grid {
                None => DEFAULT_CACHE_GRID,
                Some(grid) => match grid.as_slice() {
                    &[nx, ny, nz] => [nx, ny, nz],
                    _ => return Err(IntegratorArgsError::CacheGridLength(grid.len())),
                },
            };
            integrator.setup_cache_table(nx, ny, nz)?;
            printer.push_line(format!("Cache table: {nx} x {ny} x {nz} cells").into());
        } else {
            if cache_grid.is_some() && !no_cache {
                format!("The {kind} process can't use a cache table; ignoring --cache-grid").warn();
            }
            printer.push_line("No cache table".into());
        }
        printer.display();

        Ok(IntegratorParams { integrator, kind })
    }
}

/// Parse a process name, e.g. "synchrotron".
pub(super) fn parse_process(process: Option<&str>) -> Result<IntegratorKind, IntegratorArgsError> {
    let process = process.ok_or(IntegratorArgsError::NoProcess)?;
    IntegratorKind::from_str(&process.trim().to_lowercase())
        .map_err(|_| IntegratorArgsError::UnknownProcess(process.to_string()))
}

/// Parse a frequency (radio processes) or a photon energy (gamma-ray
/// processes) into SI units. Other processes don't need a parameter; they
/// get their default.
pub(super) fn parse_skymap_parameter(
    kind: IntegratorKind,
    parameter: Option<&str>,
) -> Result<f64, IntegratorArgsError> {
    let parameter = match parameter {
        None => return Ok(kind.default_parameter()),
        Some(p) => p,
    };
    if kind.is_radio() {
        Ok(parse_freq_si(parameter)?)
    } else if kind.is_gamma_ray() {
        Ok(parse_energy_si(parameter)?)
    } else {
        format!("The {kind} process doesn't use a skymap parameter; ignoring '{parameter}'").warn();
        Ok(kind.default_parameter())
    }
}

fn electrons(energy_steps: usize) -> Result<Arc<dyn CosmicRayDensity>, ModelError> {
    let axis = EnergyAxis::geometric_with_steps(0.01 * GEV, 1e4 * GEV, energy_steps)?;
    Ok(Arc::new(PowerLawCosmicRays::local_electrons(axis)))
}

/// The dark-matter particle's rest-mass energy for the built-in halo.
const DARK_MATTER_REST_ENERGY: f64 = 100.0 * GEV;

fn protons(energy_steps: usize) -> Result<Arc<dyn CosmicRayDensity>, ModelError> {
    protons_up_to(1e5 * GEV, energy_steps)
}

/// Photons absorbed on the CMB have hundreds of TeV, so their parent protons
/// need a longer axis.
fn protons_up_to(
    max_energy: f64,
    energy_steps: usize,
) -> Result<Arc<dyn CosmicRayDensity>, ModelError> {
    let axis = EnergyAxis::geometric_with_steps(1.0 * GEV, max_energy, energy_steps)?;
    Ok(Arc::new(PowerLawCosmicRays::local_protons(axis)))
}

/// Set up `kind` with the built-in Galaxy models.
fn build_integrator(
    kind: IntegratorKind,
    rule: Option<QuadratureRule>,
    energy_steps: usize,
) -> Result<Box<dyn Integrator>, IntegratorArgsError> {
    let ionized = Arc::new(ExponentialDisk::warm_ionized_medium());
    let neutral = Arc::new(ExponentialDisk::neutral_hydrogen());
    let field = Arc::new(ToroidalField::default());

    macro_rules! with_rule {
        ($integrator:expr) => {{
            let integrator = $integrator;
            match rule {
                Some(rule) => Box::new(integrator.with_rule(rule)) as Box<dyn Integrator>,
                None => Box::new(integrator),
            }
        }};
    }

    let integrator: Box<dyn Integrator> = match kind {
        IntegratorKind::DispersionMeasure => with_rule!(DispersionMeasureIntegrator::new(ionized)),
        IntegratorKind::RotationMeasure => {
            with_rule!(RotationMeasureIntegrator::new(field, ionized))
        }
        IntegratorKind::FreeFree => with_rule!(FreeFreeIntegrator::new(ionized)),
        IntegratorKind::Synchrotron => {
            with_rule!(SynchrotronIntegrator::new(field, electrons(energy_steps)?))
        }
        IntegratorKind::SynchroAbsorption => {
            let integrator =
                SynchroAbsorptionIntegrator::new(field, electrons(energy_steps)?, ionized);
            match rule {
                None => Box::new(integrator),
                Some(
                    QuadratureRule::Trapezoid { steps }
                    | QuadratureRule::Simpson { steps }
                    | QuadratureRule::Sum { steps },
                ) => Box::new(integrator.with_steps(steps)),
                Some(rule) => {
                    format!("The {kind} process always uses the trapezoid rule; ignoring '{rule}'")
                        .warn();
                    Box::new(integrator)
                }
            }
        }
        IntegratorKind::PiZero => with_rule!(PiZeroIntegrator::new(
            vec1![protons(energy_steps)?],
            neutral,
            Arc::new(PionDecayCrossSection::new()),
        )),
        IntegratorKind::PiZeroAbsorption => with_rule!(PiZeroAbsorptionIntegrator::new(
            vec1![protons_up_to(1e7 * GEV, energy_steps)?],
            neutral,
            Arc::new(PionDecayCrossSection::new()),
        )),
        IntegratorKind::InverseCompton => with_rule!(InverseComptonIntegrator::new(
            electrons(energy_steps)?,
            Arc::new(BlackbodyPhotonField::cmb()),
            Arc::new(KleinNishina),
        )),
        IntegratorKind::Bremsstrahlung => with_rule!(BremsstrahlungIntegrator::new(
            electrons(energy_steps)?,
            neutral,
            Arc::new(BremsstrahlungCrossSection::new()),
        )),
        IntegratorKind::DarkMatter => with_rule!(DarkMatterIntegrator::new(
            Arc::new(NfwProfile::milky_way()),
            Arc::new(QuarkContinuumSpectrum::new(DARK_MATTER_REST_ENERGY)?),
        )),
    };
    debug!("Built the {kind} integrator");
    Ok(integrator)
}

#[derive(Error, Debug)]
pub(super) enum IntegratorArgsError {
    #[error("No process was specified. Supported processes: {}", *INTEGRATOR_KINDS_COMMA_SEPARATED)]
    NoProcess,

    #[error("Unknown process '{0}'. Supported processes: {}", *INTEGRATOR_KINDS_COMMA_SEPARATED)]
    UnknownProcess(String),

    #[error("{0}")]
    Quadrature(String),

    #[error("The observer position needs exactly 3 values (x, y, z), but {0} were given")]
    ObserverLength(usize),

    #[error("The cache grid needs exactly 3 values (nx, ny, nz), but {0} were given")]
    CacheGridLength(usize),

    #[error(transparent)]
    Units(#[from] UnitParseError),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Integrator(#[from] IntegratorError),
}
