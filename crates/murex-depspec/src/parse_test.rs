// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use rstest::rstest;

use super::*;
use crate::options::ParseOptions;
use crate::spec_tree::{DependencyLabel, DependencySpec, FetchableUriSpec, LicenseSpec, SetSpec};

fn opts() -> ParseOptions {
    ParseOptions::default()
}

#[rstest]
fn test_parse_flat_dependencies() {
    let tree = parse_dependency_spec("cat/one cat/two", &opts()).unwrap();
    let DependencySpec::All(children) = &tree else {
        panic!("root must be All");
    };
    assert_eq!(children.len(), 2);
    assert!(matches!(children[0], DependencySpec::Package(_)));
    assert_eq!(tree.to_root_string(), "cat/one cat/two");
}

#[rstest]
fn test_parse_nested_groups() {
    let tree = parse_dependency_spec(
        "cat/base || ( cat/a cat/b ) foo? ( cat/c ) !bar? ( cat/d )",
        &opts(),
    )
    .unwrap();
    let DependencySpec::All(children) = &tree else {
        panic!("root must be All");
    };
    assert_eq!(children.len(), 4);
    let DependencySpec::Any(any_children) = &children[1] else {
        panic!("expected an Any group");
    };
    assert_eq!(any_children.len(), 2);
    let DependencySpec::Conditional(cond, _) = &children[2] else {
        panic!("expected a conditional group");
    };
    assert_eq!(cond.flag, "foo");
    assert!(!cond.inverse);
    let DependencySpec::Conditional(cond, _) = &children[3] else {
        panic!("expected a conditional group");
    };
    assert!(cond.inverse);
}

#[rstest]
fn test_parse_blocks_and_sets() {
    let tree = parse_dependency_spec("!cat/weak !!cat/strong @myset", &opts()).unwrap();
    let DependencySpec::All(children) = &tree else {
        panic!("root must be All");
    };
    let DependencySpec::Block(weak) = &children[0] else {
        panic!("expected a block");
    };
    assert!(!weak.strong);
    let DependencySpec::Block(strong) = &children[1] else {
        panic!("expected a block");
    };
    assert!(strong.strong);
    let DependencySpec::NamedSet(set) = &children[2] else {
        panic!("expected a named set");
    };
    assert_eq!(set.name, "myset");
    assert_eq!(tree.to_root_string(), "!cat/weak !!cat/strong @myset");
}

#[rstest]
fn test_parse_labels() {
    let tree = parse_dependency_spec("build: cat/a run+post: cat/b", &opts()).unwrap();
    let DependencySpec::All(children) = &tree else {
        panic!("root must be All");
    };
    let DependencySpec::Labels(labels) = &children[0] else {
        panic!("expected labels");
    };
    assert_eq!(labels.labels, vec![DependencyLabel::Build]);
    let DependencySpec::Labels(labels) = &children[2] else {
        panic!("expected labels");
    };
    assert_eq!(
        labels.labels,
        vec![DependencyLabel::Run, DependencyLabel::Post]
    );
}

#[rstest]
fn test_parse_annotations() {
    let tree = parse_dependency_spec("cat/pkg [[ note = optional ]]", &opts()).unwrap();
    let DependencySpec::All(children) = &tree else {
        panic!("root must be All");
    };
    let DependencySpec::Package(spec) = &children[0] else {
        panic!("expected a package");
    };
    assert_eq!(
        spec.annotations().get("note").map(String::as_str),
        Some("optional")
    );
    assert_eq!(tree.to_root_string(), "cat/pkg [[ note = optional ]]");
}

#[rstest]
#[case("cat/a (")]
#[case("cat/a )")]
#[case("|| cat/a")]
#[case("||")]
#[case("foo? cat/a")]
#[case("[[ note = dangling ]]")]
#[case("cat/a [[ note = unterminated")]
#[case("cat/a -> b")]
fn test_parse_dependency_errors(#[case] input: &str) {
    assert!(
        parse_dependency_spec(input, &opts()).is_err(),
        "'{input}' should not parse"
    );
}

#[rstest]
fn test_any_groups_disallowed_by_options() {
    let options = ParseOptions {
        allow_any_groups: false,
        ..ParseOptions::permissive()
    };
    assert!(parse_dependency_spec("|| ( cat/a cat/b )", &options).is_err());
    assert!(parse_dependency_spec("cat/a cat/b", &options).is_ok());
}

#[rstest]
fn test_parse_license_tree() {
    let tree = parse_license_spec("GPL-2 doc? ( FDL-1.1 ) || ( MIT BSD )", &opts()).unwrap();
    let LicenseSpec::All(children) = &tree else {
        panic!("root must be All");
    };
    assert_eq!(children.len(), 3);
    assert!(matches!(children[0], LicenseSpec::License(_)));
    // labels never appear in license trees
    assert!(parse_license_spec("build: GPL-2", &opts()).is_err());
}

#[rstest]
fn test_parse_provide_tree_rejects_any() {
    assert!(parse_provide_spec("|| ( virtual/a virtual/b )", &opts()).is_err());
    assert!(parse_provide_spec("virtual/a", &opts()).is_ok());
}

#[rstest]
fn test_parse_fetchable_with_rename() {
    let tree = parse_fetchable_uri_spec(
        "mirror://gnu/foo-1.tar.gz -> renamed-1.tar.gz",
        &opts(),
    )
    .unwrap();
    let FetchableUriSpec::All(children) = &tree else {
        panic!("root must be All");
    };
    let FetchableUriSpec::Uri(uri) = &children[0] else {
        panic!("expected a URI");
    };
    assert_eq!(uri.uri, "mirror://gnu/foo-1.tar.gz");
    assert_eq!(uri.rename.as_deref(), Some("renamed-1.tar.gz"));
    assert_eq!(uri.filename(), "renamed-1.tar.gz");
    assert_eq!(
        tree.to_root_string(),
        "mirror://gnu/foo-1.tar.gz -> renamed-1.tar.gz"
    );
}

#[rstest]
fn test_arrow_forbidden_outside_fetchable() {
    assert!(parse_simple_uri_spec("http://a -> b", &opts()).is_err());
    let options = ParseOptions {
        allow_fetch_renames: false,
        ..ParseOptions::permissive()
    };
    assert!(parse_fetchable_uri_spec("http://a -> b", &options).is_err());
}

#[rstest]
fn test_parse_set_tree() {
    let tree = parse_set_spec("cat/pkg @other-set", &opts()).unwrap();
    let SetSpec::All(children) = &tree else {
        panic!("root must be All");
    };
    assert_eq!(children.len(), 2);
    assert!(matches!(children[0], SetSpec::Package(_)));
    assert!(matches!(children[1], SetSpec::NamedSet(_)));
    // no groups of any kind inside set contents
    assert!(parse_set_spec("use? ( cat/pkg )", &opts()).is_err());
    assert!(parse_set_spec("|| ( cat/a cat/b )", &opts()).is_err());
}

#[rstest]
fn test_plain_text_tree() {
    let tree = parse_plain_text_spec("strip test? ( userpriv )", &opts()).unwrap();
    assert_eq!(tree.to_root_string(), "strip test? ( userpriv )");
}
