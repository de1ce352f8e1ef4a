// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use murex_depspec::{PackageDepSpec, ParseOptions};
use murex_id::ActionKind;
use murex_repository::fixtures::FakeRepository;
use rstest::rstest;

use super::*;
use crate::test_environment::TestEnvironment;

fn spec(text: &str) -> PackageDepSpec {
    PackageDepSpec::parse(text, &ParseOptions::default()).unwrap()
}

#[rstest]
fn test_all_versions_sorted() {
    let env = TestEnvironment::new("/");
    let repo = FakeRepository::new("fake");
    repo.add_version("cat", "pkg", "2.0");
    repo.add_version("cat", "pkg", "1.0");
    repo.add_version("cat", "other", "3.0");
    env.add_repository(10, repo);

    let ids = Selection::AllVersionsSorted(
        Generator::Matches(spec("cat/pkg"), MatchPackageOptions::default()).unfiltered(),
    )
    .execute(&env)
    .unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0].version().to_string(), "1.0");
    assert_eq!(ids[1].version().to_string(), "2.0");
}

#[rstest]
fn test_best_version_only_prefers_importance() {
    let env = TestEnvironment::new("/");
    let first = FakeRepository::new("first");
    first.add_version("cat", "pkg", "1.0");
    let second = FakeRepository::new("second");
    second.add_version("cat", "pkg", "1.0");
    second.add_version("cat", "pkg", "2.0");
    env.add_repository(1, first);
    env.add_repository(10, second.clone());

    let ids = Selection::BestVersionOnly(
        Generator::Matches(spec("cat/pkg"), MatchPackageOptions::default()).unfiltered(),
    )
    .execute(&env)
    .unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0].version().to_string(), "2.0");
    assert_eq!(ids[0].repository_name().as_str(), "second");
}

#[rstest]
fn test_installed_at_root_filter() {
    let env = TestEnvironment::new("/");
    let available = FakeRepository::new("available");
    available.add_version("cat", "pkg", "2.0");
    let installed = FakeRepository::new_installed("installed", "/");
    installed.add_version("cat", "pkg", "1.0");
    env.add_repository(10, available);
    env.add_repository(5, installed);

    let ids = Selection::AllVersionsSorted(
        Generator::Matches(spec("cat/pkg"), MatchPackageOptions::default())
            .filtered(Filter::InstalledAtRoot),
    )
    .execute(&env)
    .unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0].repository_name().as_str(), "installed");

    let ids = Selection::AllVersionsSorted(
        Generator::Matches(spec("cat/pkg"), MatchPackageOptions::default())
            .filtered(Filter::SupportsAction(ActionKind::Install)),
    )
    .execute(&env)
    .unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0].repository_name().as_str(), "available");
}

#[rstest]
fn test_not_masked_filter() {
    let env = TestEnvironment::new("/");
    let repo = FakeRepository::new("fake");
    let bad = repo.add_version("cat", "pkg", "2.0");
    bad.add_mask(murex_id::Mask::User {
        description: "broken".to_string(),
    });
    repo.add_version("cat", "pkg", "1.0");
    env.add_repository(10, repo);

    let ids = Selection::AllVersionsSorted(
        Generator::Matches(spec("cat/pkg"), MatchPackageOptions::default())
            .filtered(Filter::NotMasked),
    )
    .execute(&env)
    .unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0].version().to_string(), "1.0");

    // a user unmask restores the ID
    env.add_user_unmask(bad.as_ref());
    let ids = Selection::AllVersionsSorted(
        Generator::Matches(spec("cat/pkg"), MatchPackageOptions::default())
            .filtered(Filter::NotMasked),
    )
    .execute(&env)
    .unwrap();
    assert_eq!(ids.len(), 2);
}

#[rstest]
fn test_require_exactly_one() {
    let env = TestEnvironment::new("/");
    let repo = FakeRepository::new("fake");
    repo.add_version("cat", "pkg", "1.0");
    repo.add_version("cat", "pkg", "2.0");
    env.add_repository(10, repo);

    let err = Selection::RequireExactlyOne(
        Generator::Matches(spec("cat/pkg"), MatchPackageOptions::default()).unfiltered(),
    )
    .execute(&env)
    .unwrap_err();
    assert!(matches!(err, Error::AmbiguousPackageName { .. }));

    let ids = Selection::RequireExactlyOne(
        Generator::Matches(spec("=cat/pkg-1.0"), MatchPackageOptions::default()).unfiltered(),
    )
    .execute(&env)
    .unwrap();
    assert_eq!(ids.len(), 1);

    let err = Selection::RequireExactlyOne(
        Generator::Matches(spec("cat/none"), MatchPackageOptions::default()).unfiltered(),
    )
    .execute(&env)
    .unwrap_err();
    assert!(matches!(err, Error::NoSuchPackage { .. }));
}

#[rstest]
fn test_fetch_unique_qualified_package_name() {
    let env = TestEnvironment::new("/");
    let repo = FakeRepository::new("fake");
    repo.add_version("cat-one", "unique", "1.0");
    repo.add_version("cat-one", "dup", "1.0");
    repo.add_version("cat-two", "dup", "1.0");
    env.add_repository(10, repo);

    let name = crate::fetch_unique_qualified_package_name(
        &env,
        murex_foundation::name::PackageNamePart::new("unique").unwrap(),
    )
    .unwrap();
    assert_eq!(name.to_string(), "cat-one/unique");

    let err = crate::fetch_unique_qualified_package_name(
        &env,
        murex_foundation::name::PackageNamePart::new("dup").unwrap(),
    )
    .unwrap_err();
    let Error::AmbiguousPackageName { alternatives, .. } = err else {
        panic!("expected AmbiguousPackageName");
    };
    assert_eq!(alternatives.len(), 2);

    let err = crate::fetch_unique_qualified_package_name(
        &env,
        murex_foundation::name::PackageNamePart::new("missing").unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NoSuchPackage { .. }));
}
