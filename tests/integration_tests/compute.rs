// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::Write;

use approx::assert_relative_eq;
use indoc::indoc;
use tempfile::{Builder, TempDir};

use crate::{get_cmd_output, read_json, skylos};
use ::skylos::{
    constants::UNSEEN,
    skymap::{SkymapOutput, SkymapRangeOutput},
};

#[test]
fn test_dm_map() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("dm.json");

    #[rustfmt::skip]
    let cmd = skylos()
        .args([
            "compute",
            "--process", "dm",
            "--nside", "2",
            "--no-progress-bars",
            "--output", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "compute failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("skylos compute complete."), "{stdout}");

    let map: SkymapOutput = read_json(&output);
    assert_eq!(map.nside, 2);
    assert_eq!(map.pixels.len(), 48);
    assert!(map.pixels.iter().all(|&p| p.is_finite() && p > 0.0));
    assert_eq!(map.units, "m^-2");
}

#[test]
fn test_skymap_alias_and_dry_run() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("rm.json");

    #[rustfmt::skip]
    let cmd = skylos()
        .args([
            "skymap",
            "-p", "rm",
            "--dry-run",
            "-o", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "dry run failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Dry run -- exiting now."), "{stdout}");
    assert!(!output.exists());
}

#[test]
fn test_unknown_process_fails() {
    let cmd = skylos()
        .args(["compute", "--process", "cosmic-strings", "--dry-run"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error: "), "{stderr}");
    assert!(stderr.contains("Unknown process 'cosmic-strings'"), "{stderr}");
}

#[test]
fn test_masked_range_from_arguments_file() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("ff_range.json");
    let mut args_file = Builder::new()
        .suffix(".toml")
        .tempfile_in(tmp_dir.path())
        .expect("couldn't make a temp file");
    write!(
        args_file,
        indoc! {r#"
            nside = 2
            parameter = "100MHz"
            parameter_max = "10GHz"
            parameter_steps = 3
            latitude_range = [-30.0, 30.0]

            [integrator]
            process = "free-free"
        "#}
    )
    .unwrap();

    #[rustfmt::skip]
    let cmd = skylos()
        .args([
            "compute",
            &format!("{}", args_file.path().display()),
            "--num-threads", "2",
            "--output", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "compute failed: {}", cmd.err().unwrap());

    let range: SkymapRangeOutput = read_json(&output);
    assert_eq!(range.maps.len(), 3);
    assert_relative_eq!(range.maps[0].parameter, 1e8);
    assert_relative_eq!(range.maps[1].parameter, 1e9, max_relative = 1e-12);
    assert_relative_eq!(range.maps[2].parameter, 1e10);

    let unseen = UNSEEN as f32;
    for map in &range.maps {
        let computed = map.pixels.iter().filter(|&&p| p != unseen).count();
        assert!(computed > 0 && computed < map.pixels.len());
    }
}
