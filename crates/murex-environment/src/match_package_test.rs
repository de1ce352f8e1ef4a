// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::sync::Arc;

use murex_depspec::{PackageDepSpec, ParseOptions, SetSpec};
use murex_repository::fixtures::FakeRepository;
use rstest::rstest;

use super::*;
use crate::test_environment::TestEnvironment;

fn spec(text: &str) -> PackageDepSpec {
    PackageDepSpec::parse(text, &ParseOptions::default()).unwrap()
}

fn env_with_fake() -> (TestEnvironment, Arc<FakeRepository>) {
    let env = TestEnvironment::new("/");
    let repo = FakeRepository::new("fake");
    env.add_repository(10, repo.clone());
    (env, repo)
}

#[rstest]
#[case("cat/pkg", true)]
#[case("cat/*", true)]
#[case("*/pkg", true)]
#[case("other/pkg", false)]
#[case(">=cat/pkg-1.0", true)]
#[case(">=cat/pkg-3.0", false)]
#[case("=cat/pkg-2.0", true)]
#[case("=cat/pkg-2*", true)]
#[case("~cat/pkg-2.0", true)]
#[case("cat/pkg:1", true)]
#[case("cat/pkg:9", false)]
#[case("cat/pkg:*", true)]
#[case("cat/pkg:=", true)]
#[case("cat/pkg:1/2=", true)]
#[case("cat/pkg::fake", true)]
#[case("cat/pkg::other", false)]
#[case("cat/pkg[>=1.0&<3.0]", true)]
#[case("cat/pkg[>=3.0|<1.5]", false)]
fn test_match_components(#[case] text: &str, #[case] expected: bool) {
    let (env, repo) = env_with_fake();
    let id = repo.add_version("cat", "pkg", "2.0");
    id.set_slot("1");
    assert_eq!(
        match_package(&env, &spec(text), id.as_ref(), &MatchPackageOptions::default()),
        expected,
        "{text}"
    );
}

#[rstest]
fn test_match_choice_requirements() {
    let (env, repo) = env_with_fake();
    let id = repo.add_version("cat", "pkg", "1.0");
    id.set_choices(&["nls", "-doc"]);

    let options = MatchPackageOptions::default();
    assert!(match_package(&env, &spec("cat/pkg[nls]"), id.as_ref(), &options));
    assert!(!match_package(&env, &spec("cat/pkg[doc]"), id.as_ref(), &options));
    assert!(match_package(&env, &spec("cat/pkg[-doc]"), id.as_ref(), &options));
    assert!(!match_package(&env, &spec("cat/pkg[-nls]"), id.as_ref(), &options));

    // unknown flags fail unless a default is given
    assert!(!match_package(&env, &spec("cat/pkg[missing]"), id.as_ref(), &options));
    assert!(match_package(&env, &spec("cat/pkg[missing(+)]"), id.as_ref(), &options));
    assert!(!match_package(&env, &spec("cat/pkg[missing(-)]"), id.as_ref(), &options));

    let ignore = MatchPackageOptions {
        ignore_additional_requirements: true,
        ..MatchPackageOptions::default()
    };
    assert!(match_package(&env, &spec("cat/pkg[doc]"), id.as_ref(), &ignore));
}

#[rstest]
fn test_match_choice_requirements_with_owner() {
    let (env, repo) = env_with_fake();
    let target = repo.add_version("cat", "target", "1.0");
    target.set_choices(&["nls"]);
    let owner = repo.add_version("cat", "owner", "1.0");
    owner.set_choices(&["nls"]);

    let options = MatchPackageOptions {
        ignore_additional_requirements: false,
        from_id: Some(owner.clone() as Arc<dyn murex_id::PackageID>),
    };
    assert!(match_package(&env, &spec("cat/target[nls=]"), target.as_ref(), &options));
    assert!(match_package(&env, &spec("cat/target[nls?]"), target.as_ref(), &options));

    owner.set_choices(&["-nls"]);
    assert!(!match_package(&env, &spec("cat/target[nls=]"), target.as_ref(), &options));
    // owner disabled: foo? imposes nothing
    assert!(match_package(&env, &spec("cat/target[nls?]"), target.as_ref(), &options));
}

#[rstest]
fn test_environment_choice_override_wins() {
    let (env, repo) = env_with_fake();
    let id = repo.add_version("cat", "pkg", "1.0");
    id.set_choices(&["-nls"]);
    env.override_choice("nls", true);
    assert!(match_package(
        &env,
        &spec("cat/pkg[nls]"),
        id.as_ref(),
        &MatchPackageOptions::default()
    ));
}

#[rstest]
fn test_condition_met() {
    let (env, repo) = env_with_fake();
    let id = repo.add_version("cat", "pkg", "1.0");
    id.set_choices(&["nls"]);

    let cond: murex_depspec::ConditionalDepSpec = "nls?".parse().unwrap();
    assert!(condition_met(&env, id.as_ref(), &cond));
    let cond: murex_depspec::ConditionalDepSpec = "!nls?".parse().unwrap();
    assert!(!condition_met(&env, id.as_ref(), &cond));
    let cond: murex_depspec::ConditionalDepSpec = "doc?".parse().unwrap();
    assert!(!condition_met(&env, id.as_ref(), &cond));
}

#[rstest]
fn test_key_requirements() {
    let (env, repo) = env_with_fake();
    let id = repo.add_version("cat", "pkg", "1.0");
    id.set_slot("2");
    let options = MatchPackageOptions::default();
    assert!(match_package(&env, &spec("cat/pkg[.SLOT=2]"), id.as_ref(), &options));
    assert!(!match_package(&env, &spec("cat/pkg[.SLOT=3]"), id.as_ref(), &options));
    assert!(!match_package(&env, &spec("cat/pkg[.MISSING=x]"), id.as_ref(), &options));
}

#[rstest]
fn test_match_package_in_set() {
    let (env, repo) = env_with_fake();
    let id = repo.add_version("cat", "pkg", "1.0");

    let set = SetSpec::All(vec![SetSpec::Package(spec("cat/pkg"))]);
    assert!(match_package_in_set(
        &env,
        &set,
        id.as_ref(),
        &MatchPackageOptions::default()
    ));

    env.add_set("inner", SetSpec::All(vec![SetSpec::Package(spec("cat/pkg"))]));
    let set = murex_depspec::parse_set_spec("@inner", &ParseOptions::default()).unwrap();
    assert!(match_package_in_set(
        &env,
        &set,
        id.as_ref(),
        &MatchPackageOptions::default()
    ));

    let set = murex_depspec::parse_set_spec("@missing", &ParseOptions::default()).unwrap();
    assert!(!match_package_in_set(
        &env,
        &set,
        id.as_ref(),
        &MatchPackageOptions::default()
    ));
}
