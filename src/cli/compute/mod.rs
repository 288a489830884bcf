// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Compute HEALPix sky maps of a process and write them out as JSON.


use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    sync::Arc,
};

use clap::Parser;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{
    display_warnings, parse_skymap_parameter, InfoPrinter, IntegratorArgs, IntegratorParams,
    ARG_FILE_HELP,
};
use crate::{
    constants::*,
    healpix::nside2npix,
    integrator::{Integrator, IntegratorKind},
    misc::expensive_op,
    scheduler::{default_num_threads, CancelToken},
    skymap::{
        CircularWindow, ComputeSummary, InvertMask, MaskList, RectangularWindow, Skymap,
        SkymapMask, SkymapRange,
    },
    SkylosError,
};

lazy_static::lazy_static! {
    static ref NSIDE_HELP: String =
        format!("The HEALPix resolution of the map; a power of 2. Default: {DEFAULT_NSIDE}");

    static ref PARAMETER_HELP: String =
        format!("The frequency of radio maps (e.g. 408MHz) or the photon energy of gamma-ray maps (e.g. 1GeV). Default: {} MHz or {} GeV",
                DEFAULT_RADIO_FREQUENCY / MHZ, DEFAULT_GAMMA_ENERGY / GEV);
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ComputeArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "integrator")]
    #[serde(default)]
    pub(super) integrator_args: IntegratorArgs,

    #[clap(short, long, help = NSIDE_HELP.as_str(), help_heading = "SKY MAP")]
    pub(super) nside: Option<u32>,

    #[clap(long, help = PARAMETER_HELP.as_str(), help_heading = "SKY MAP")]
    pub(super) parameter: Option<String>,

    /// Compute a range of maps from --parameter up to this frequency or
    /// energy, geometrically spaced. Needs --parameter-steps.
    #[clap(long, help_heading = "SKY MAP")]
    pub(super) parameter_max: Option<String>,

    /// The number of maps in a range of maps.
    #[clap(long, help_heading = "SKY MAP")]
    pub(super) parameter_steps: Option<usize>,

    /// Only compute pixels with Galactic latitudes within this range
    /// [degrees].
    #[clap(
        long,
        help_heading = "MASK",
        number_of_values = 2,
        allow_hyphen_values = true,
        value_names = &["MIN", "MAX"]
    )]
    pub(super) latitude_range: Option<Vec<f64>>,

    /// Only compute pixels with Galactic longitudes from START eastwards to
    /// END [degrees]. The range may wrap through 0.
    #[clap(
        long,
        help_heading = "MASK",
        number_of_values = 2,
        allow_hyphen_values = true,
        value_names = &["START", "END"]
    )]
    pub(super) longitude_range: Option<Vec<f64>>,

    /// Only compute pixels within RADIUS of Galactic (B, L) [degrees].
    #[clap(
        long,
        help_heading = "MASK",
        number_of_values = 3,
        allow_hyphen_values = true,
        value_names = &["B", "L", "RADIUS"]
    )]
    pub(super) circle: Option<Vec<f64>>,

    /// Compute the pixels the other mask options exclude, rather than the ones
    /// they include.
    #[clap(long, help_heading = "MASK")]
    #[serde(default)]
    pub(super) invert_mask: bool,

    /// The number of threads to use. Default: all available.
    #[clap(short = 't', long, help_heading = "COMPUTE")]
    pub(super) num_threads: Option<usize>,

    /// The path to the output JSON file. Default: skylos_<process>.json
    #[clap(short, long, help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,
}

/// Everything needed to compute maps.
pub(super) struct ComputeParams {
    pub(super) integrator: Box<dyn Integrator>,
    pub(super) kind: IntegratorKind,
    pub(super) maps: Maps,
    pub(super) num_threads: usize,
    pub(super) output: PathBuf,
}

pub(super) enum Maps {
    Single(Skymap),
    Range(SkymapRange),
}

impl ComputeArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    pub(super) fn merge(self) -> Result<ComputeArgs, SkylosError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let ComputeArgs {
                args_file: _,
                integrator_args,
                nside,
                parameter,
                parameter_max,
                parameter_steps,
                latitude_range,
                longitude_range,
                circle,
                invert_mask,
                num_threads,
                output,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(ComputeArgs {
                args_file: None,
                integrator_args: cli_args.integrator_args.merge(integrator_args),
                nside: cli_args.nside.or(nside),
                parameter: cli_args.parameter.or(parameter),
                parameter_max: cli_args.parameter_max.or(parameter_max),
                parameter_steps: cli_args.parameter_steps.or(parameter_steps),
                latitude_range: cli_args.latitude_range.or(latitude_range),
                longitude_range: cli_args.longitude_range.or(longitude_range),
                circle: cli_args.circle.or(circle),
                invert_mask: cli_args.invert_mask || invert_mask,
                num_threads: cli_args.num_threads.or(num_threads),
                output: cli_args.output.or(output),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<ComputeParams, SkylosError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            integrator_args,
            nside,
            parameter,
            parameter_max,
            parameter_steps,
            latitude_range,
            longitude_range,
            circle,
            invert_mask,
            num_threads,
            output,
        } = self;

        let IntegratorParams { integrator, kind } = integrator_args.parse()?;
        let nside = nside.unwrap_or(DEFAULT_NSIDE);
        let num_threads = match num_threads {
            Some(0) => return Err(ComputeArgsError::ZeroThreads.into()),
            Some(n) => n,
            None => default_num_threads(),
        };
        let output = output.unwrap_or_else(|| PathBuf::from(format!("skylos_{kind}.json")));

        let mask = parse_mask(latitude_range, longitude_range, circle, invert_mask)?;

        let min = parse_skymap_parameter(kind, parameter.as_deref())?;
        let maps = match (parameter_max, parameter_steps) {
            (None, None) => Maps::Single(Skymap::new(nside, min)?),
            (Some(max), Some(steps)) => {
                if !(kind.is_radio() || kind.is_gamma_ray()) {
                    return Err(ComputeArgsError::RangeWithoutParameter(kind).into());
                }
                let max = parse_skymap_parameter(kind, Some(&max))?;
                Maps::Range(SkymapRange::new(nside, min, max, steps)?)
            }
            _ => return Err(ComputeArgsError::IncompleteRange.into()),
        };
        // Every pixel centre is tested against every mask; at high nside
        // this takes a while.
        let maps = expensive_op(
            || match maps {
                Maps::Single(map) => map.with_mask(&mask).map(Maps::Single),
                Maps::Range(range) => range.with_mask(&mask).map(Maps::Range),
            },
            "Still applying the sky mask",
        )?;

        let mut printer = InfoPrinter::new("Sky maps".into());
        printer.push_line(format!("nside {nside} ({} pixels)", nside2npix(nside)).into());
        match &maps {
            Maps::Single(map) => {
                printer
                    .push_line(format!("{} unmasked pixels", map.unmasked_pixel_count()).into());
                if kind.is_radio() || kind.is_gamma_ray() {
                    printer.push_line(describe_parameter(kind, map.parameter()).into());
                }
            }
            Maps::Range(range) => {
                let mut block = vec![format!("{} maps", range.maps().len()).into()];
                block.extend(
                    range
                        .parameters()
                        .into_iter()
                        .map(|p| describe_parameter(kind, p).into()),
                );
                printer.push_block(block);
            }
        }
        printer.push_line(format!("Mask: {}", mask.description()).into());
        printer.push_line(format!("Using {num_threads} threads").into());
        printer.push_line(format!("Output: {}", output.display()).into());
        printer.display();

        display_warnings();

        Ok(ComputeParams {
            integrator,
            kind,
            maps,
            num_threads,
            output,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), SkylosError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()
    }
}

impl ComputeParams {
    pub(super) fn run(self) -> Result<(), SkylosError> {
        let ComputeParams {
            mut integrator,
            kind,
            maps,
            num_threads,
            output,
        } = self;

        let cancel = CancelToken::new();
        if let Err(e) = cancel.install_signal_handler() {
            warn!("Couldn't install a signal handler; Ctrl-C will not stop cleanly: {e}");
        }

        let (summaries, json) = match maps {
            Maps::Single(mut map) => {
                let summary = map.compute_with_threads(&mut *integrator, num_threads, &cancel)?;
                if let Some(mean) = map.mean() {
                    info!("Mean pixel value: {mean:e} {}", map.units());
                }
                (vec![summary], serde_json::to_string(&map.to_output())?)
            }
            Maps::Range(mut range) => {
                let summaries =
                    range.compute_with_threads(&mut *integrator, num_threads, &cancel)?;
                (summaries, serde_json::to_string(&range.to_output())?)
            }
        };

        let mut f = BufWriter::new(File::create(&output)?);
        f.write_all(json.as_bytes())?;
        f.flush()?;
        info!("Wrote {}", output.display());

        report(kind, &summaries)
    }
}

fn report(kind: IntegratorKind, summaries: &[ComputeSummary]) -> Result<(), SkylosError> {
    let computed: usize = summaries.iter().map(|s| s.computed).sum();
    let failed: usize = summaries.iter().map(|s| s.failures.len()).sum();
    info!("{kind}: {computed} pixels computed, {failed} failed");
    if summaries.iter().any(|s| s.cancelled) {
        return Err(SkylosError::Cancelled);
    }
    Ok(())
}

fn describe_parameter(kind: IntegratorKind, parameter: f64) -> String {
    if kind.is_radio() {
        format!("{:.3} MHz", parameter / MHZ)
    } else {
        format!("{:.3} GeV", parameter / GEV)
    }
}

/// Combine the mask options. With no options, every pixel is computed.
fn parse_mask(
    latitude_range: Option<Vec<f64>>,
    longitude_range: Option<Vec<f64>>,
    circle: Option<Vec<f64>>,
    invert: bool,
) -> Result<MaskList, SkylosError> {
    let mut masks = MaskList::new();

    if latitude_range.is_some() || longitude_range.is_some() {
        let latitude = match latitude_range.as_deref() {
            None => [-90.0, 90.0],
            Some(&[min, max]) => [min, max],
            Some(v) => {
                return Err(ComputeArgsError::MaskLength {
                    option: "latitude-range",
                    expected: 2,
                    got: v.len(),
                }
                .into())
            }
        };
        let longitude = match longitude_range.as_deref() {
            // Equal ends cover every longitude.
            None => [0.0, 0.0],
            Some(&[start, end]) => [start, end],
            Some(v) => {
                return Err(ComputeArgsError::MaskLength {
                    option: "longitude-range",
                    expected: 2,
                    got: v.len(),
                }
                .into())
            }
        };
        masks.add_mask(Arc::new(RectangularWindow::new(latitude, longitude)?));
    }

    match circle.as_deref() {
        None => (),
        Some(&[b, l, radius]) => {
            masks.add_mask(Arc::new(CircularWindow::from_galactic_degrees(b, l, radius)?))
        }
        Some(v) => {
            return Err(ComputeArgsError::MaskLength {
                option: "circle",
                expected: 3,
                got: v.len(),
            }
            .into())
        }
    }

    if invert {
        let inner: Arc<dyn SkymapMask> = Arc::new(masks);
        let mut inverted = MaskList::new();
        inverted.add_mask(Arc::new(InvertMask(inner)));
        masks = inverted;
    }
    Ok(masks)
}

#[derive(Error, Debug)]
pub(super) enum ComputeArgsError {
    #[error("The number of threads must be at least 1")]
    ZeroThreads,

    #[error("A range of maps needs both --parameter-max and --parameter-steps")]
    IncompleteRange,

    #[error("The {0} process has no frequency or energy, so it can't be computed over a range")]
    RangeWithoutParameter(IntegratorKind),

    #[error("--{option} needs {expected} values, but {got} were given")]
    MaskLength {
        option: &'static str,
        expected: usize,
        got: usize,
    },
}
