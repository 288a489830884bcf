// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod compute;
mod no_stderr;
mod profile;

use std::{path::Path, process::Output, str::from_utf8};

use assert_cmd::{output::OutputError, Command};

fn skylos() -> Command {
    Command::cargo_bin("skylos").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> T {
    let contents = std::fs::read_to_string(path).expect("output file exists");
    serde_json::from_str(&contents).expect("output file is valid JSON")
}
