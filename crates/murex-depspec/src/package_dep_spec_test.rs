// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use murex_foundation::version::{parse_version, VersionOperator};
use proptest::prelude::*;
use rstest::rstest;

use super::*;

fn parse(text: &str) -> PackageDepSpec {
    PackageDepSpec::parse(text, &ParseOptions::default()).unwrap()
}

#[rstest]
#[case("cat/pkg")]
#[case(">=cat/pkg-1.0")]
#[case("=cat/pkg-1.2*")]
#[case("~cat/pkg-2.0")]
#[case("cat/pkg:0")]
#[case("cat/pkg:=")]
#[case("cat/pkg:*")]
#[case("cat/pkg:2/1=")]
#[case("cat/pkg::myrepo")]
#[case("cat/pkg::myrepo?")]
#[case("cat/pkg::myrepo??")]
#[case("cat/pkg::first->second")]
#[case("cat/pkg::/")]
#[case("cat/pkg::/chroot?")]
#[case("cat/pkg[foo]")]
#[case("cat/pkg[foo,-bar]")]
#[case("cat/pkg[foo=]")]
#[case("cat/pkg[foo?]")]
#[case("cat/pkg[!foo?]")]
#[case("cat/pkg[foo(+)]")]
#[case("cat/pkg[-bar(-)]")]
#[case("cat/pkg[>=1.0&<2.0]")]
#[case("cat/pkg[>=1.0|<0.5]")]
#[case("cat/pkg[.origin=upstream]")]
#[case("cat/*")]
#[case("*/pkg")]
#[case("*/*")]
#[case(">=sys-apps/shellutils-0.99:0/0=::repo?[nls,-doc]")]
fn test_parse_roundtrip(#[case] text: &str) {
    let spec = parse(text);
    assert_eq!(spec.to_string(), text);
    let reparsed = parse(&spec.to_string());
    assert_eq!(spec, reparsed);
}

#[rstest]
#[case("")]
#[case("cat")]
#[case(">=cat/pkg")]
#[case(">=cat/pkg-")]
#[case("cat/pkg:")]
#[case("cat/pkg::")]
#[case("cat/pkg[")]
#[case("cat/pkg[]")]
#[case("cat/pkg[>=1.0*]")]
#[case("cat/pkg[!foo=]")]
#[case("cat/pkg[.nokey]")]
#[case("cat/pkg extra")]
#[case("cat/pkg-1.0")]
fn test_parse_invalid(#[case] text: &str) {
    assert!(
        PackageDepSpec::parse(text, &ParseOptions::default()).is_err(),
        "'{text}' should not parse"
    );
}

#[rstest]
fn test_parse_components() {
    let spec = parse(">=sys-apps/shellutils-0.99:0/0=::repo?[nls,-doc]");
    assert_eq!(
        spec.package_name().unwrap().to_string(),
        "sys-apps/shellutils"
    );
    assert_eq!(spec.version_requirements().len(), 1);
    assert_eq!(
        spec.version_requirements()[0].op,
        VersionOperator::GreaterOrEqual
    );
    assert!(matches!(
        spec.slot_requirement(),
        Some(SlotRequirement::Exact { locked: true, .. })
    ));
    let to = spec.installable_to_repository().unwrap();
    assert_eq!(to.repository, "repo");
    assert!(!to.include_masked);
    assert_eq!(spec.choice_requirements().len(), 2);
    assert_eq!(spec.choice_requirements()[0].name, "nls");
    assert_eq!(
        spec.choice_requirements()[0].kind,
        ChoiceRequirementKind::Enabled
    );
    assert_eq!(
        spec.choice_requirements()[1].kind,
        ChoiceRequirementKind::Disabled
    );
}

#[rstest]
fn test_version_with_revision_splits() {
    let spec = parse("=cat/pkg-1.0-r2");
    assert_eq!(spec.package_name().unwrap().to_string(), "cat/pkg");
    assert_eq!(
        spec.version_requirements()[0].version,
        parse_version("1.0-r2").unwrap()
    );
}

#[rstest]
fn test_star_requires_equals() {
    assert!(PackageDepSpec::parse(">=cat/pkg-1.0*", &ParseOptions::default()).is_err());
    let spec = parse("=cat/pkg-1.0*");
    assert_eq!(
        spec.version_requirements()[0].op,
        VersionOperator::EqualStarPrefix
    );
}

#[rstest]
fn test_version_requirements_modes() {
    let spec = parse("cat/pkg[>=1.0&<2.0]");
    assert_eq!(
        spec.version_requirements_mode(),
        VersionRequirementsMode::And
    );
    assert!(spec.version_requirements_satisfied_by(&parse_version("1.5").unwrap()));
    assert!(!spec.version_requirements_satisfied_by(&parse_version("2.0").unwrap()));

    let spec = parse("cat/pkg[>=1.0|<0.5]");
    assert_eq!(spec.version_requirements_mode(), VersionRequirementsMode::Or);
    assert!(spec.version_requirements_satisfied_by(&parse_version("0.1").unwrap()));
    assert!(spec.version_requirements_satisfied_by(&parse_version("1.0").unwrap()));
    assert!(!spec.version_requirements_satisfied_by(&parse_version("0.7").unwrap()));
}

#[rstest]
fn test_restrictive_options() {
    let no_wildcards = ParseOptions {
        allow_wildcards: false,
        ..ParseOptions::permissive()
    };
    assert!(PackageDepSpec::parse("cat/*", &no_wildcards).is_err());
    assert!(PackageDepSpec::parse("cat/pkg", &no_wildcards).is_ok());

    let no_slots = ParseOptions {
        allow_slot_deps: false,
        ..ParseOptions::permissive()
    };
    assert!(PackageDepSpec::parse("cat/pkg:0", &no_slots).is_err());

    let no_slot_equals = ParseOptions {
        allow_slot_equal_deps: false,
        ..ParseOptions::permissive()
    };
    assert!(PackageDepSpec::parse("cat/pkg:=", &no_slot_equals).is_err());
    assert!(PackageDepSpec::parse("cat/pkg:0", &no_slot_equals).is_ok());

    let no_use = ParseOptions {
        allow_use_deps: false,
        ..ParseOptions::permissive()
    };
    assert!(PackageDepSpec::parse("cat/pkg[foo]", &no_use).is_err());

    let no_defaults = ParseOptions {
        allow_use_dep_defaults: false,
        ..ParseOptions::permissive()
    };
    assert!(PackageDepSpec::parse("cat/pkg[foo(+)]", &no_defaults).is_err());

    let metadata = ParseOptions::metadata();
    assert!(PackageDepSpec::parse("cat/pkg::repo", &metadata).is_err());
    assert!(PackageDepSpec::parse("cat/pkg[.key=value]", &metadata).is_err());
}

#[rstest]
fn test_builder() {
    let spec = PackageDepSpec::builder()
        .package("cat/pkg".parse().unwrap())
        .version_requirement(
            VersionOperator::GreaterOrEqual,
            parse_version("1.0").unwrap(),
        )
        .exact_slot("2".parse().unwrap())
        .build()
        .unwrap();
    assert_eq!(spec.to_string(), ">=cat/pkg-1.0:2");

    assert!(PackageDepSpec::builder().build().is_err());
}

proptest! {
    #[test]
    fn prop_parse_roundtrip(
        category in "[a-z][a-z0-9]{1,8}",
        package in "[a-z][a-z]{1,8}",
        op in prop::sample::select(vec!["", "<", "<=", "=", "~", ">=", ">"]),
        major in 0u32..100,
        minor in 0u32..100,
        slot in prop::option::of(0u32..10),
    ) {
        let version = if op.is_empty() {
            String::new()
        } else {
            format!("-{major}.{minor}")
        };
        let slot = slot.map(|s| format!(":{s}")).unwrap_or_default();
        let text = format!("{op}{category}/{package}{version}{slot}");
        let spec = PackageDepSpec::parse(&text, &ParseOptions::default()).unwrap();
        prop_assert_eq!(spec.to_string(), text);
        let reparsed = PackageDepSpec::parse(&spec.to_string(), &ParseOptions::default()).unwrap();
        prop_assert_eq!(spec, reparsed);
    }
}

#[rstest]
fn test_name_constraint_matching() {
    let name: murex_foundation::name::QualifiedPackageName = "cat/pkg".parse().unwrap();
    assert!(parse("cat/pkg").name_constraint().matches(&name));
    assert!(parse("cat/*").name_constraint().matches(&name));
    assert!(parse("*/pkg").name_constraint().matches(&name));
    assert!(parse("*/*").name_constraint().matches(&name));
    assert!(!parse("other/pkg").name_constraint().matches(&name));
    assert!(!parse("cat/other").name_constraint().matches(&name));
}
