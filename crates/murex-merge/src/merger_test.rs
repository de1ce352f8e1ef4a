// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use murex_environment::{HookResult, TestEnvironment};
use rstest::rstest;

use super::*;
use crate::error::Error;

struct Fixture {
    _dir: tempfile::TempDir,
    image: PathBuf,
    root: PathBuf,
    env: TestEnvironment,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("image");
    let root = dir.path().join("root");
    std::fs::create_dir_all(&image).unwrap();
    std::fs::create_dir_all(&root).unwrap();
    Fixture {
        env: TestEnvironment::new(&root),
        _dir: dir,
        image,
        root,
    }
}

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn merger_with_options<'a>(fixture: &'a Fixture, options: FSMergerOptions) -> FSMerger<'a> {
    let mut params = FSMergerParams::new(&fixture.env, &fixture.image, &fixture.root);
    params.options = options;
    params.no_chown = true;
    FSMerger::new(params)
}

fn merger(fixture: &Fixture) -> FSMerger<'_> {
    merger_with_options(
        fixture,
        FSMergerOptions {
            allow_empty_dirs: true,
            ..FSMergerOptions::default()
        },
    )
}

#[rstest]
fn test_merge_files_and_dirs() {
    let fixture = fixture();
    write(&fixture.image.join("etc/config"), "configuration\n");
    write(&fixture.image.join("usr/bin/prog"), "binary\n");

    let mut merger = merger(&fixture);
    merger.check().unwrap();
    merger.merge().unwrap();

    assert_eq!(
        std::fs::read_to_string(fixture.root.join("etc/config")).unwrap(),
        "configuration\n"
    );
    assert_eq!(
        std::fs::read_to_string(fixture.root.join("usr/bin/prog")).unwrap(),
        "binary\n"
    );
    assert!(merger
        .merged_entries()
        .contains(&fixture.root.join("usr/bin/prog")));
}

#[rstest]
fn test_merge_reuses_existing_dirs() {
    let fixture = fixture();
    write(&fixture.image.join("etc/new"), "new\n");
    std::fs::create_dir_all(fixture.root.join("etc")).unwrap();
    write(&fixture.root.join("etc/old"), "old\n");

    let mut merger = merger(&fixture);
    merger.check().unwrap();
    merger.merge().unwrap();

    assert_eq!(
        std::fs::read_to_string(fixture.root.join("etc/old")).unwrap(),
        "old\n"
    );
    assert_eq!(
        std::fs::read_to_string(fixture.root.join("etc/new")).unwrap(),
        "new\n"
    );
}

#[rstest]
fn test_dir_over_file_fails_check() {
    let fixture = fixture();
    write(&fixture.image.join("etc/sub/file"), "x\n");
    write(&fixture.root.join("etc"), "a file where a dir should go");

    let mut merger = merger(&fixture);
    let err = merger.check().unwrap_err();
    let Error::CheckFailed { failures } = err else {
        panic!("expected CheckFailed");
    };
    assert!(failures.iter().any(|f| f.contains("etc")));
}

#[rstest]
fn test_dir_over_symlink_to_dir_is_reused() {
    let fixture = fixture();
    write(&fixture.image.join("etc/file"), "x\n");
    std::fs::create_dir_all(fixture.root.join("real-etc")).unwrap();
    symlink("real-etc", fixture.root.join("etc")).unwrap();

    let mut merger = merger(&fixture);
    merger.check().unwrap();
    merger.merge().unwrap();
    assert_eq!(
        std::fs::read_to_string(fixture.root.join("real-etc/file")).unwrap(),
        "x\n"
    );
}

#[rstest]
fn test_dir_over_dangling_symlink_fails() {
    let fixture = fixture();
    write(&fixture.image.join("etc/file"), "x\n");
    symlink("nowhere", fixture.root.join("etc")).unwrap();

    let mut merger = merger(&fixture);
    assert!(merger.check().is_err());
}

#[rstest]
fn test_symlink_cycle_at_destination_fails() {
    let fixture = fixture();
    write(&fixture.image.join("etc/file"), "x\n");
    symlink("loop2", fixture.root.join("etc")).unwrap();
    symlink("etc", fixture.root.join("loop2")).unwrap();

    let mut merger = merger(&fixture);
    let err = merger.check().unwrap_err();
    let Error::CheckFailed { failures } = err else {
        panic!("expected CheckFailed");
    };
    assert!(failures.iter().any(|f| f.contains("cycle")));
}

#[rstest]
fn test_sym_over_file_replaces_the_file() {
    let fixture = fixture();
    symlink("b", fixture.image.join("a")).unwrap();
    write(&fixture.root.join("a"), "previously a file");

    let mut merger = merger(&fixture);
    merger.check().unwrap();
    merger.merge().unwrap();

    let metadata = fixture.root.join("a").symlink_metadata().unwrap();
    assert!(metadata.file_type().is_symlink());
    assert_eq!(
        std::fs::read_link(fixture.root.join("a")).unwrap(),
        PathBuf::from("b")
    );
}

#[rstest]
fn test_sym_over_dir_fails() {
    let fixture = fixture();
    symlink("b", fixture.image.join("a")).unwrap();
    std::fs::create_dir_all(fixture.root.join("a")).unwrap();

    let mut merger = merger(&fixture);
    assert!(merger.check().is_err());
}

#[rstest]
fn test_file_over_symlink_replaces_the_symlink() {
    let fixture = fixture();
    write(&fixture.image.join("a"), "now a file\n");
    symlink("b", fixture.root.join("a")).unwrap();

    let mut merger = merger(&fixture);
    merger.check().unwrap();
    merger.merge().unwrap();

    let metadata = fixture.root.join("a").symlink_metadata().unwrap();
    assert!(metadata.is_file());
    assert_eq!(
        std::fs::read_to_string(fixture.root.join("a")).unwrap(),
        "now a file\n"
    );
}

#[rstest]
fn test_empty_dir_policy() {
    let fixture = fixture();
    std::fs::create_dir_all(fixture.image.join("var/empty")).unwrap();

    let mut strict = merger_with_options(&fixture, FSMergerOptions::default());
    let err = strict.check().unwrap_err();
    let Error::CheckFailed { failures } = err else {
        panic!("expected CheckFailed");
    };
    assert!(failures.iter().any(|f| f.contains("empty")));
    // a failed check leaves the root untouched
    assert!(!fixture.root.join("var").exists());

    let mut permissive = merger_with_options(
        &fixture,
        FSMergerOptions {
            allow_empty_dirs: true,
            ..FSMergerOptions::default()
        },
    );
    permissive.check().unwrap();
    permissive.merge().unwrap();
    assert!(fixture.root.join("var/empty").is_dir());
}

#[rstest]
fn test_empty_image_policy() {
    let fixture = fixture();
    let mut strict = merger_with_options(&fixture, FSMergerOptions::default());
    assert!(strict.check().is_err());

    let mut permissive = merger(&fixture);
    permissive.check().unwrap();
}

#[rstest]
fn test_preserve_mtimes() {
    let fixture = fixture();
    let src = fixture.image.join("bin/prog");
    write(&src, "x\n");
    let old = FileTime::from_unix_time(1_500_000_000, 123_456_789);
    filetime::set_file_mtime(&src, old).unwrap();

    let mut merger = merger_with_options(
        &fixture,
        FSMergerOptions {
            preserve_mtimes: true,
            ..FSMergerOptions::default()
        },
    );
    merger.check().unwrap();
    merger.merge().unwrap();

    let merged = fixture.root.join("bin/prog").metadata().unwrap();
    let mtime = FileTime::from_last_modification_time(&merged);
    assert_eq!(mtime.unix_seconds(), 1_500_000_000);
}

#[rstest]
fn test_fix_mtimes_before_clamps() {
    let fixture = fixture();
    let ancient = fixture.image.join("bin/ancient");
    let recent = fixture.image.join("bin/recent");
    write(&ancient, "x\n");
    write(&recent, "y\n");
    filetime::set_file_mtime(&ancient, FileTime::from_unix_time(1000, 0)).unwrap();
    filetime::set_file_mtime(&recent, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    let reference = std::time::SystemTime::UNIX_EPOCH
        + std::time::Duration::from_secs(1_500_000_000);
    let mut params = FSMergerParams::new(&fixture.env, &fixture.image, &fixture.root);
    params.options = FSMergerOptions {
        preserve_mtimes: true,
        ..FSMergerOptions::default()
    };
    params.no_chown = true;
    params.fix_mtimes_before = Some(reference);
    let mut merger = FSMerger::new(params);
    merger.check().unwrap();
    merger.merge().unwrap();

    let clamped = FileTime::from_last_modification_time(
        &fixture.root.join("bin/ancient").metadata().unwrap(),
    );
    assert_eq!(clamped.unix_seconds(), 1_500_000_000);
    let kept = FileTime::from_last_modification_time(
        &fixture.root.join("bin/recent").metadata().unwrap(),
    );
    assert_eq!(kept.unix_seconds(), 1_600_000_000);
}

#[rstest]
fn test_config_protection() {
    let fixture = fixture();
    write(&fixture.image.join("etc/app.conf"), "new settings\n");
    write(&fixture.root.join("etc/app.conf"), "user settings\n");

    let mut params = FSMergerParams::new(&fixture.env, &fixture.image, &fixture.root);
    params.no_chown = true;
    params.config_protect = Box::new(|_, dst: &Path| dst.to_string_lossy().contains("/etc/"));
    let mut merger = FSMerger::new(params);
    merger.check().unwrap();
    merger.merge().unwrap();

    // the user's file is untouched; the new one lands alongside
    assert_eq!(
        std::fs::read_to_string(fixture.root.join("etc/app.conf")).unwrap(),
        "user settings\n"
    );
    assert_eq!(
        std::fs::read_to_string(fixture.root.join("etc/app.conf.cfgpro")).unwrap(),
        "new settings\n"
    );
    assert!(merger
        .merged_entries()
        .contains(&fixture.root.join("etc/app.conf.cfgpro")));
}

#[rstest]
fn test_config_protection_identical_files_merge_in_place() {
    let fixture = fixture();
    write(&fixture.image.join("etc/app.conf"), "same\n");
    write(&fixture.root.join("etc/app.conf"), "same\n");

    let mut params = FSMergerParams::new(&fixture.env, &fixture.image, &fixture.root);
    params.no_chown = true;
    params.config_protect = Box::new(|_, _| true);
    let mut merger = FSMerger::new(params);
    merger.merge().unwrap();

    assert!(!fixture.root.join("etc/app.conf.cfgpro").exists());
}

#[rstest]
fn test_rewrite_symlinks() {
    let fixture = fixture();
    write(&fixture.image.join("usr/lib/libreal.so"), "elf\n");
    symlink(
        fixture.image.join("usr/lib/libreal.so"),
        fixture.image.join("usr/lib/lib.so"),
    )
    .unwrap();

    let mut merger = merger_with_options(
        &fixture,
        FSMergerOptions {
            rewrite_symlinks: true,
            ..FSMergerOptions::default()
        },
    );
    merger.check().unwrap();
    merger.merge().unwrap();

    assert_eq!(
        std::fs::read_link(fixture.root.join("usr/lib/lib.so")).unwrap(),
        fixture.root.join("usr/lib/libreal.so")
    );
}

#[rstest]
fn test_install_under() {
    let fixture = fixture();
    write(&fixture.image.join("bin/prog"), "x\n");

    let mut params = FSMergerParams::new(&fixture.env, &fixture.image, &fixture.root);
    params.no_chown = true;
    params.install_under = PathBuf::from("/opt/app");
    let mut merger = FSMerger::new(params);
    merger.merge().unwrap();

    assert!(fixture.root.join("opt/app/bin/prog").is_file());
}

#[rstest]
fn test_hooks_fire_and_can_abort() {
    let fixture = fixture();
    write(&fixture.image.join("bin/prog"), "x\n");

    fixture.env.add_hook(Box::new(|hook| {
        if hook.name == "merger_install_file_pre"
            && hook
                .vars
                .get("INSTALL_DESTINATION")
                .is_some_and(|d| d.ends_with("bin/prog"))
        {
            HookResult {
                max_exit_status: 1,
                output: Vec::new(),
            }
        } else {
            HookResult::default()
        }
    }));

    let mut merger = merger(&fixture);
    let err = merger.merge().unwrap_err();
    assert!(matches!(err, Error::HookAborted { .. }));
    assert!(!fixture.root.join("bin/prog").exists());
}

#[rstest]
fn test_deterministic_walk_order() {
    let fixture = fixture();
    write(&fixture.image.join("b/file"), "x\n");
    write(&fixture.image.join("a/file"), "x\n");
    write(&fixture.image.join("c"), "x\n");

    let mut params = FSMergerParams::new(&fixture.env, &fixture.image, &fixture.root);
    params.no_chown = true;
    let mut merger = FSMerger::new(params);
    merger.merge().unwrap();
    let entries: Vec<_> = merger.merged_entries().iter().cloned().collect();

    // merged entries report in sorted order; the walk visits a, b, c
    assert_eq!(
        entries,
        vec![
            fixture.root.join("a"),
            fixture.root.join("a/file"),
            fixture.root.join("b"),
            fixture.root.join("b/file"),
            fixture.root.join("c"),
        ]
    );
}
