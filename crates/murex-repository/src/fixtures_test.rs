// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use murex_id::{
    Action,
    ActionKind,
    CanonicalForm,
    DiscardOutput,
    InstallAction,
    PackageID,
    WantPhase,
};
use rstest::rstest;

use super::*;

#[rstest]
fn test_enumeration() {
    let repo = FakeRepository::new("fake");
    repo.add_version("cat-one", "pkg", "1.0");
    repo.add_version("cat-one", "pkg", "2.0");
    repo.add_version("cat-two", "other", "1.0");

    let categories = repo.category_names();
    assert_eq!(categories.len(), 2);

    let names = repo.package_names("cat-one".parse::<CategoryNameBuf>().unwrap().as_ref());
    assert_eq!(names.len(), 1);

    let name: QualifiedPackageName = "cat-one/pkg".parse().unwrap();
    let ids = repo.package_ids(&name);
    assert_eq!(ids.len(), 2);
    // ascending version order
    assert!(ids[0].version() < ids[1].version());

    assert!(repo.has_package_named(&name));
    assert!(!repo.has_package_named(&"cat-one/missing".parse().unwrap()));
}

#[rstest]
fn test_canonical_form() {
    let repo = FakeRepository::new("fake");
    let id = repo.add_version("cat", "pkg", "1.0");
    id.set_slot("2");
    assert_eq!(id.canonical_form(CanonicalForm::Full), "cat/pkg-1.0:2::fake");
    assert_eq!(id.canonical_form(CanonicalForm::Version), "1.0");
    assert_eq!(id.canonical_form(CanonicalForm::NoVersion), "cat/pkg::fake");
}

#[rstest]
fn test_installed_vs_installable_actions() {
    let repo = FakeRepository::new("fake");
    let id = repo.add_version("cat", "pkg", "1.0");
    assert!(id.supports_action(ActionKind::Install));
    assert!(!id.supports_action(ActionKind::Uninstall));

    let installed = FakeRepository::new_installed("installed", "/");
    let id = installed.add_version("cat", "pkg", "1.0");
    assert!(id.supports_action(ActionKind::Uninstall));
    assert!(!id.supports_action(ActionKind::Install));
    assert!(installed.installed_root_key().is_some());
    assert!(installed.capabilities().destination);
}

#[rstest]
fn test_metadata_keys() {
    let repo = FakeRepository::new("fake");
    let id = repo.add_version("cat", "pkg", "1.0");
    id.set_keywords("x86 ~amd64");
    id.set_run_dependencies("cat/dep-a cat/dep-b");
    id.set_choices(&["nls", "-doc"]);

    let keywords = id.keywords_key().unwrap();
    assert_eq!(keywords.as_keywords().unwrap().len(), 2);

    let deps = id.run_dependencies_key().unwrap();
    assert_eq!(
        deps.as_dependencies().unwrap().to_root_string(),
        "cat/dep-a cat/dep-b"
    );

    assert!(id.choice_enabled("nls".parse::<murex_foundation::name::ChoiceNameWithPrefixBuf>().unwrap().as_ref()));
    assert!(!id.choice_enabled("doc".parse::<murex_foundation::name::ChoiceNameWithPrefixBuf>().unwrap().as_ref()));

    assert!(id.build_dependencies_key().is_none());
}

#[rstest]
fn test_install_action_contract() {
    let repo = FakeRepository::new("fake");
    let id = repo.add_version("cat", "pkg", "2.0");

    let installed = FakeRepository::new_installed("installed", "/");
    let old = installed.add_version("cat", "pkg", "1.0");

    let mut uninstalled = Vec::new();
    let mut phases = Vec::new();
    {
        let mut action = Action::Install(InstallAction {
            destination: "installed".parse().unwrap(),
            replacing: vec![old.clone() as std::sync::Arc<dyn PackageID>],
            perform_uninstall: Box::new(|replaced| {
                uninstalled.push(replaced.canonical_form(CanonicalForm::Full));
                Ok(())
            }),
            want_phase: Box::new(|phase| {
                phases.push(phase.to_string());
                WantPhase::Continue
            }),
            output_manager: Box::new(DiscardOutput),
        });
        id.perform_action(&mut action).unwrap();
    }
    assert_eq!(phases, vec!["setup", "build", "install"]);
    assert_eq!(uninstalled, vec!["cat/pkg-1.0:0::installed"]);
    assert_eq!(id.performed_actions(), vec![ActionKind::Install]);
}

#[rstest]
fn test_install_action_abort() {
    let repo = FakeRepository::new("fake");
    let id = repo.add_version("cat", "pkg", "2.0");

    let mut action = Action::Install(InstallAction {
        destination: "installed".parse().unwrap(),
        replacing: Vec::new(),
        perform_uninstall: Box::new(|_| Ok(())),
        want_phase: Box::new(|phase| {
            if phase == "build" {
                WantPhase::Abort
            } else {
                WantPhase::Continue
            }
        }),
        output_manager: Box::new(DiscardOutput),
    });
    let err = id.perform_action(&mut action).unwrap_err();
    assert!(matches!(err, murex_id::Error::ActionAborted { .. }));
    assert!(id.performed_actions().is_empty());
}

#[rstest]
fn test_unsupported_action() {
    let repo = FakeRepository::new("fake");
    let id = repo.add_version("cat", "pkg", "1.0");
    let mut action = Action::Uninstall(murex_id::UninstallAction {
        config_protect: String::new(),
        if_for_install: None,
        output_manager: Box::new(DiscardOutput),
    });
    let err = id.perform_action(&mut action).unwrap_err();
    assert!(matches!(err, murex_id::Error::UnsupportedAction { .. }));
}
