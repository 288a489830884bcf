// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use tempfile::TempDir;

use crate::{get_cmd_output, skylos};

#[test]
fn test_compute_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("sync.json");

    #[rustfmt::skip]
    let cmd = skylos()
        .args([
            "compute",
            "--process", "synchrotron",
            "--nside", "1",
            "--cache-grid", "6", "6", "3",
            "--output", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "compute failed: {}", cmd.err().unwrap());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_profile_no_stderr() {
    #[rustfmt::skip]
    let cmd = skylos()
        .args([
            "profile",
            "--process", "free-free",
            "--parameter", "1GHz",
            "--steps", "10",
        ])
        .ok();
    assert!(cmd.is_ok(), "profile failed: {}", cmd.err().unwrap());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}
