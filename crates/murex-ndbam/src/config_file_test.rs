// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::io::Write;

use rstest::rstest;

use super::KeyValueConfigFile;

fn write_conf(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("test.conf");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[rstest]
fn test_basic() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_conf(
        &dir,
        "# comment\n\nndbam_format = 1\nrepository_format=murex-1\n  spaced  =  value  \n",
    );
    let conf = KeyValueConfigFile::read(&path).unwrap();
    assert_eq!(conf.get("ndbam_format"), Some("1"));
    assert_eq!(conf.get("repository_format"), Some("murex-1"));
    assert_eq!(conf.get("spaced"), Some("value"));
    assert_eq!(conf.get("missing"), None);
    assert_eq!(conf.iter().count(), 3);
}

#[rstest]
fn test_last_value_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_conf(&dir, "key = first\nkey = second\n");
    let conf = KeyValueConfigFile::read(&path).unwrap();
    assert_eq!(conf.get("key"), Some("second"));
}

#[rstest]
#[case("no equals sign\n")]
#[case(" = empty key\n")]
fn test_malformed(#[case] contents: &str) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_conf(&dir, contents);
    assert!(KeyValueConfigFile::read(&path).is_err());
}
