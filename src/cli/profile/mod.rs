// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sample the integrand of a process along a single line of sight.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{
    display_warnings, parse_skymap_parameter, IntegratorArgs, IntegratorParams, ARG_FILE_HELP,
};
use crate::{
    constants::KPC,
    coord::Direction,
    integrator::{IntegratorKind, LosProfile},
    scheduler::CancelToken,
    SkylosError,
};

const DEFAULT_PROFILE_STEPS: usize = 100;

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ProfileArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "integrator")]
    #[serde(default)]
    pub(super) integrator_args: IntegratorArgs,

    /// Galactic latitude of the line of sight [degrees]. Default: 0
    #[clap(short, long, allow_hyphen_values = true, help_heading = "LINE OF SIGHT")]
    pub(super) latitude: Option<f64>,

    /// Galactic longitude of the line of sight [degrees]. Default: 0
    #[clap(short = 'L', long, allow_hyphen_values = true, help_heading = "LINE OF SIGHT")]
    pub(super) longitude: Option<f64>,

    /// The frequency (radio) or photon energy (gamma rays) of the profile.
    #[clap(long, help_heading = "LINE OF SIGHT")]
    pub(super) parameter: Option<String>,

    /// The number of intervals between the observer and the Galactic
    /// boundary. Default: 100
    #[clap(long, help_heading = "LINE OF SIGHT")]
    pub(super) steps: Option<usize>,

    /// Write the profile to this JSON file rather than the log.
    #[clap(short, long, help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ProfileOutput {
    process: IntegratorKind,
    latitude_deg: f64,
    longitude_deg: f64,
    parameter: f64,
    units: &'static str,
    /// The full line of sight integral.
    integral: f64,
    profile: LosProfile,
}

impl ProfileArgs {
    pub(super) fn merge(self) -> Result<ProfileArgs, SkylosError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let ProfileArgs {
                args_file: _,
                integrator_args,
                latitude,
                longitude,
                parameter,
                steps,
                output,
            } = unpack_arg_file!(arg_file);

            Ok(ProfileArgs {
                args_file: None,
                integrator_args: cli_args.integrator_args.merge(integrator_args),
                latitude: cli_args.latitude.or(latitude),
                longitude: cli_args.longitude.or(longitude),
                parameter: cli_args.parameter.or(parameter),
                steps: cli_args.steps.or(steps),
                output: cli_args.output.or(output),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), SkylosError> {
        trace!("{:#?}", self);
        let ProfileArgs {
            args_file: _,
            integrator_args,
            latitude,
            longitude,
            parameter,
            steps,
            output,
        } = self;

        let IntegratorParams {
            mut integrator,
            kind,
        } = integrator_args.parse()?;
        let latitude = latitude.unwrap_or(0.0);
        let longitude = longitude.unwrap_or(0.0);
        let direction = Direction::from_galactic_degrees(latitude, longitude)?;
        let parameter = parse_skymap_parameter(kind, parameter.as_deref())?;
        let steps = steps.unwrap_or(DEFAULT_PROFILE_STEPS);
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        integrator.set_skymap_parameter(parameter);
        if integrator.is_cache_table_enabled() {
            integrator.init_cache_table(&CancelToken::new())?;
        }
        let profile = integrator.los_profile(&direction, parameter, steps)?;
        let integral = integrator.integrate_over_los(&direction)?;
        let units = integrator.pixel_units();
        info!("Line of sight integral at (b = {latitude}°, l = {longitude}°): {integral:e} {units}");

        match output {
            Some(path) => {
                let out = ProfileOutput {
                    process: kind,
                    latitude_deg: latitude,
                    longitude_deg: longitude,
                    parameter,
                    units,
                    integral,
                    profile,
                };
                let mut f = BufWriter::new(File::create(&path)?);
                serde_json::to_writer_pretty(&mut f, &out)?;
                f.flush()?;
                info!("Wrote {}", path.display());
            }
            None => {
                for (d, v) in profile.distances.iter().zip(&profile.values) {
                    info!("{:10.4} kpc  {v:e}", d / KPC);
                }
            }
        }
        Ok(())
    }
}
