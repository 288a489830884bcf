// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use tempfile::TempDir;

use crate::{read_json, skylos};

#[test]
fn test_profile_json() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output = tmp_dir.path().join("profile.json");

    #[rustfmt::skip]
    let cmd = skylos()
        .args([
            "profile",
            "--process", "dm",
            "--latitude", "-10",
            "--longitude", "30",
            "--steps", "20",
            "--output", &format!("{}", output.display()),
        ])
        .ok();
    assert!(cmd.is_ok(), "profile failed: {}", cmd.err().unwrap());

    let profile: serde_json::Value = read_json(&output);
    assert_eq!(profile["process"], "dm");
    assert_eq!(profile["latitude_deg"], -10.0);
    let distances = profile["profile"]["distances"].as_array().unwrap();
    let values = profile["profile"]["values"].as_array().unwrap();
    assert_eq!(distances.len(), values.len());
    assert!(distances.len() > 1);
    assert!(profile["integral"].as_f64().unwrap() > 0.0);
}
