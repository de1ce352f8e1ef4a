// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use murex_depspec::{parse_dependency_spec, PackageDepSpec, ParseOptions};
use murex_environment::TestEnvironment;
use murex_repository::fixtures::FakeRepository;
use rstest::rstest;

use super::*;

fn spec(text: &str) -> PackageDepSpec {
    PackageDepSpec::parse(text, &ParseOptions::default()).unwrap()
}

struct Setup {
    env: TestEnvironment,
    available: std::sync::Arc<FakeRepository>,
    installed: std::sync::Arc<FakeRepository>,
}

fn setup() -> Setup {
    let env = TestEnvironment::new("/");
    let available = FakeRepository::new("repo");
    let installed = FakeRepository::new_installed("installed", "/");
    env.add_repository(10, available.clone());
    env.add_repository(5, installed.clone());
    Setup {
        env,
        available,
        installed,
    }
}

fn plan(setup: &Setup, targets: &[&str]) -> Result<Vec<DepListEntry>> {
    plan_with(setup, targets, DepListOptions::default())
}

fn plan_with(
    setup: &Setup,
    targets: &[&str],
    options: DepListOptions,
) -> Result<Vec<DepListEntry>> {
    let mut list = DepList::new(&setup.env, options);
    for target in targets {
        list.add_target_tree(parse_dependency_spec(target, &ParseOptions::default()).unwrap());
    }
    list.resolve()
}

fn names(entries: &[DepListEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| format!("{}:{}", e.decision.kind_name(), e.resolvent.name))
        .collect()
}

#[rstest]
fn test_simple_install() {
    let setup = setup();
    setup.available.add_version("cat", "pkg", "1.0");

    let entries = plan(&setup, &["cat/pkg"]).unwrap();
    assert_eq!(names(&entries), vec!["install:cat/pkg"]);
    assert!(entries[0].tags.contains(&DepTag::Target));
}

#[rstest]
fn test_dependencies_ordered_before_dependents() {
    let setup = setup();
    let top = setup.available.add_version("cat", "top", "1.0");
    top.set_run_dependencies("cat/mid");
    let mid = setup.available.add_version("cat", "mid", "1.0");
    mid.set_build_dependencies("cat/leaf");
    setup.available.add_version("cat", "leaf", "1.0");

    let entries = plan(&setup, &["cat/top"]).unwrap();
    assert_eq!(
        names(&entries),
        vec!["install:cat/leaf", "install:cat/mid", "install:cat/top"]
    );
}

#[rstest]
fn test_missing_target_is_all_masked() {
    let setup = setup();
    let err = plan(&setup, &["cat/none"]).unwrap_err();
    assert!(matches!(err, Error::AllMasked { .. }));
}

#[rstest]
fn test_masked_candidate_is_all_masked() {
    let setup = setup();
    let id = setup.available.add_version("cat", "pkg", "1.0");
    id.add_mask(murex_id::Mask::User {
        description: "broken".to_string(),
    });
    let err = plan(&setup, &["cat/pkg"]).unwrap_err();
    assert!(matches!(err, Error::AllMasked { .. }));
}

#[rstest]
fn test_slot_upgrade_single_resolvent() {
    let setup = setup();
    let installed = setup.installed.add_version("cat", "pkg", "0");
    installed.set_slot("0");
    let new = setup.available.add_version("cat", "pkg", "1");
    new.set_slot("0");

    let entries = plan(&setup, &["=cat/pkg-1:0"]).unwrap();
    assert_eq!(entries.len(), 1);
    let Decision::Upgrade { from, to } = &entries[0].decision else {
        panic!("expected an upgrade");
    };
    assert_eq!(from.version().to_string(), "0");
    assert_eq!(to.version().to_string(), "1");
}

#[rstest]
fn test_parallel_slots_get_two_resolvents() {
    let setup = setup();
    let one = setup.available.add_version("cat", "pkg", "1.0");
    one.set_slot("1");
    let two = setup.available.add_version("cat", "pkg", "2.0");
    two.set_slot("2");

    let entries = plan(&setup, &["=cat/pkg-1.0", "=cat/pkg-2.0"]).unwrap();
    assert_eq!(entries.len(), 2);
}

#[rstest]
fn test_any_group_prefers_installed() {
    let setup = setup();
    setup.available.add_version("cat", "a", "1");
    setup.available.add_version("cat", "b", "1");
    setup.installed.add_version("cat", "a", "1");

    let entries = plan(&setup, &["|| ( cat/a cat/b )"]).unwrap();
    assert_eq!(names(&entries), vec!["no-change:cat/a"]);
}

#[rstest]
fn test_any_group_falls_back_to_installable() {
    let setup = setup();
    setup.available.add_version("cat", "b", "1");

    let entries = plan(&setup, &["|| ( cat/a cat/b )"]).unwrap();
    assert_eq!(names(&entries), vec!["install:cat/b"]);
}

#[rstest]
fn test_reinstall_policies() {
    let setup = setup();
    setup.available.add_version("cat", "pkg", "1.0");
    setup.installed.add_version("cat", "pkg", "1.0");

    let entries = plan(&setup, &["cat/pkg"]).unwrap();
    assert_eq!(names(&entries), vec!["no-change:cat/pkg"]);

    let entries = plan_with(
        &setup,
        &["cat/pkg"],
        DepListOptions {
            reinstall: ReinstallPolicy::Always,
            ..DepListOptions::default()
        },
    )
    .unwrap();
    assert_eq!(names(&entries), vec!["reinstall:cat/pkg"]);
}

#[rstest]
fn test_reinstall_if_use_changed() {
    let setup = setup();
    let new = setup.available.add_version("cat", "pkg", "1.0");
    new.set_choices(&["nls"]);
    let old = setup.installed.add_version("cat", "pkg", "1.0");
    old.set_choices(&["nls"]);

    let options = DepListOptions {
        reinstall: ReinstallPolicy::IfUseChanged,
        ..DepListOptions::default()
    };
    let entries = plan_with(&setup, &["cat/pkg"], options.clone()).unwrap();
    assert_eq!(names(&entries), vec!["no-change:cat/pkg"]);

    // disabling the flag on the installed side changes the outcome
    old.set_choices(&["-nls"]);
    let entries = plan_with(&setup, &["cat/pkg"], options).unwrap();
    assert_eq!(names(&entries), vec!["reinstall:cat/pkg"]);
}

#[rstest]
fn test_downgrade_policies() {
    let setup = setup();
    setup.available.add_version("cat", "pkg", "1.0");
    setup.installed.add_version("cat", "pkg", "2.0");

    let entries = plan(&setup, &["=cat/pkg-1.0"]).unwrap();
    assert_eq!(names(&entries), vec!["downgrade:cat/pkg"]);

    let err = plan_with(
        &setup,
        &["=cat/pkg-1.0"],
        DepListOptions {
            downgrade: DowngradePolicy::Error,
            ..DepListOptions::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::DowngradeNotAllowed { .. }));
}

#[rstest]
fn test_conditional_dependencies() {
    let setup = setup();
    let pkg = setup.available.add_version("cat", "pkg", "1.0");
    pkg.set_choices(&["extras"]);
    pkg.set_run_dependencies("extras? ( cat/extra ) other? ( cat/unwanted )");
    setup.available.add_version("cat", "extra", "1.0");
    setup.available.add_version("cat", "unwanted", "1.0");

    let entries = plan(&setup, &["cat/pkg"]).unwrap();
    assert_eq!(
        names(&entries),
        vec!["install:cat/extra", "install:cat/pkg"]
    );
}

#[rstest]
fn test_weak_block_resolved_by_upgrade() {
    let setup = setup();
    let blocker_owner = setup.available.add_version("cat", "new", "1.0");
    blocker_owner.set_run_dependencies("!<cat/old-2 >=cat/old-2");
    setup.installed.add_version("cat", "old", "1.5");
    setup.available.add_version("cat", "old", "2.0");

    let entries = plan(&setup, &["cat/new"]).unwrap();
    assert_eq!(
        names(&entries),
        vec!["upgrade:cat/old", "install:cat/new"]
    );
}

#[rstest]
fn test_weak_block_against_kept_installed_fails() {
    let setup = setup();
    let blocker_owner = setup.available.add_version("cat", "new", "1.0");
    blocker_owner.set_run_dependencies("!cat/old");
    setup.installed.add_version("cat", "old", "1.5");

    let err = plan(&setup, &["cat/new"]).unwrap_err();
    assert!(matches!(err, Error::Block { .. }));
}

#[rstest]
fn test_strong_block_is_fatal_even_when_replaced() {
    let setup = setup();
    let blocker_owner = setup.available.add_version("cat", "new", "1.0");
    blocker_owner.set_run_dependencies("!!<cat/old-2 >=cat/old-2");
    setup.installed.add_version("cat", "old", "1.5");
    setup.available.add_version("cat", "old", "2.0");

    let err = plan(&setup, &["cat/new"]).unwrap_err();
    assert!(matches!(err, Error::Block { .. }));
}

#[rstest]
fn test_block_against_planned_candidate() {
    let setup = setup();
    let a = setup.available.add_version("cat", "a", "1.0");
    a.set_run_dependencies("!cat/b");
    setup.available.add_version("cat", "b", "1.0");

    let err = plan(&setup, &["cat/a", "cat/b"]).unwrap_err();
    assert!(matches!(err, Error::Block { .. }));
}

#[rstest]
fn test_circular_build_dependency_is_an_error() {
    let setup = setup();
    let a = setup.available.add_version("cat", "a", "1.0");
    a.set_build_dependencies("cat/b");
    let b = setup.available.add_version("cat", "b", "1.0");
    b.set_build_dependencies("cat/a");

    let err = plan(&setup, &["cat/a"]).unwrap_err();
    assert!(matches!(err, Error::CircularDependency { .. }));
}

#[rstest]
fn test_post_dependency_cycle_is_broken() {
    let setup = setup();
    let a = setup.available.add_version("cat", "a", "1.0");
    a.set_run_dependencies("cat/b");
    let b = setup.available.add_version("cat", "b", "1.0");
    b.set_post_dependencies("cat/a");

    let entries = plan(&setup, &["cat/a"]).unwrap();
    assert_eq!(names(&entries), vec!["install:cat/b", "install:cat/a"]);
}

#[rstest]
fn test_annotated_run_cycle_is_broken() {
    let setup = setup();
    let a = setup.available.add_version("cat", "a", "1.0");
    a.set_run_dependencies("cat/b");
    let b = setup.available.add_version("cat", "b", "1.0");
    b.set_run_dependencies("cat/a [[ ordering = discard ]]");

    let entries = plan(&setup, &["cat/a"]).unwrap();
    assert_eq!(entries.len(), 2);
}

#[rstest]
fn test_labels_change_dependency_class() {
    let setup = setup();
    let a = setup.available.add_version("cat", "a", "1.0");
    a.set_run_dependencies("post: cat/b");
    let b = setup.available.add_version("cat", "b", "1.0");
    b.set_run_dependencies("cat/a");

    // the post label turns the a -> b edge into one that may be
    // dropped, so the cycle resolves
    let entries = plan(&setup, &["cat/a"]).unwrap();
    assert_eq!(entries.len(), 2);
}

#[rstest]
fn test_no_destination() {
    let env = TestEnvironment::new("/");
    let available = FakeRepository::new("repo");
    available.add_version("cat", "pkg", "1.0");
    env.add_repository(10, available);

    let mut list = DepList::new(&env, DepListOptions::default());
    list.add_target(spec("cat/pkg"));
    let err = list.resolve().unwrap_err();
    assert!(matches!(err, Error::NoDestination { .. }));
}

#[rstest]
fn test_named_set_target() {
    let setup = setup();
    setup.available.add_version("cat", "one", "1.0");
    setup.available.add_version("cat", "two", "1.0");
    setup.env.add_set(
        "myset",
        murex_depspec::parse_set_spec("cat/one cat/two", &ParseOptions::default()).unwrap(),
    );

    let mut list = DepList::new(&setup.env, DepListOptions::default());
    list.add_target_set(murex_foundation::name::SetName::new("myset").unwrap())
        .unwrap();
    let entries = list.resolve().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e
        .tags
        .iter()
        .any(|t| matches!(t, DepTag::GeneralSet { .. }))));

    let mut list = DepList::new(&setup.env, DepListOptions::default());
    let err = list
        .add_target_set(murex_foundation::name::SetName::new("missing").unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::NoSuchSet { .. }));
}

#[rstest]
fn test_deterministic_target_order() {
    let setup = setup();
    setup.available.add_version("cat", "one", "1.0");
    setup.available.add_version("cat", "two", "1.0");

    let entries = plan(&setup, &["cat/two", "cat/one"]).unwrap();
    assert_eq!(
        names(&entries),
        vec!["install:cat/two", "install:cat/one"]
    );
}
