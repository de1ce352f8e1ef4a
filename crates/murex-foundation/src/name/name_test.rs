// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use rstest::rstest;

use super::*;

#[rstest]
#[case("sys-apps")]
#[case("dev-libs")]
#[case("virtual")]
#[case("x11_misc")]
#[case("cat.egory")]
fn test_valid_category_names(#[case] name: &str) {
    CategoryName::new(name).unwrap();
}

#[rstest]
#[case("")]
#[case("-starts-with-hyphen")]
#[case("has a space")]
#[case("has/slash")]
fn test_invalid_category_names(#[case] name: &str) {
    assert!(CategoryName::new(name).is_err());
}

#[rstest]
#[case("coreutils")]
#[case("gtk+")]
#[case("pkg-config")]
#[case("libs_extra")]
fn test_valid_package_names(#[case] name: &str) {
    PackageNamePart::new(name).unwrap();
}

#[rstest]
#[case("")]
#[case("-bad")]
#[case("pkg-1")]
#[case("pkg-1.2.3")]
#[case("pkg-2b")]
#[case("has.dot")]
fn test_invalid_package_names(#[case] name: &str) {
    assert!(PackageNamePart::new(name).is_err());
}

#[rstest]
fn test_package_name_version_suffix_kind() {
    let err = PackageNamePart::new("pkg-1.2").unwrap_err();
    assert_eq!(err.name_kind(), NameKind::Package);
}

#[rstest]
#[case("0")]
#[case("2.4")]
#[case("stable")]
fn test_valid_slot_names(#[case] name: &str) {
    SlotName::new(name).unwrap();
}

#[rstest]
#[case("x86")]
#[case("~amd64")]
#[case("-sparc")]
#[case("*")]
#[case("-*")]
fn test_valid_keyword_names(#[case] name: &str) {
    KeywordName::new(name).unwrap();
}

#[rstest]
#[case("~")]
#[case("**")]
#[case("~-x86")]
fn test_invalid_keyword_names(#[case] name: &str) {
    assert!(KeywordName::new(name).is_err());
}

#[rstest]
fn test_set_name_star_mode() {
    let plain = SetName::new("world").unwrap();
    assert!(!plain.is_star_mode());
    assert_eq!(plain.base_name(), plain);

    let starred = SetName::new("security*").unwrap();
    assert!(starred.is_star_mode());
    assert_eq!(starred.base_name().as_str(), "security");

    assert!(SetName::new("bad**").is_err());

    let buf: SetNameBuf = "world".parse().unwrap();
    assert_eq!(buf.with_star().as_str(), "world*");
}

#[rstest]
fn test_choice_prefix_join() {
    let prefix: ChoicePrefixNameBuf = "linguas".parse().unwrap();
    let value: UnprefixedChoiceNameBuf = "en".parse().unwrap();
    assert_eq!(ChoiceNameWithPrefix::of(&prefix, &value), "linguas_en");

    let unprefixed = ChoicePrefixName::unprefixed();
    assert_eq!(ChoiceNameWithPrefix::of(unprefixed, &value), "en");
}

#[rstest]
fn test_qualified_package_name_parse_and_display() {
    let q: QualifiedPackageName = "sys-apps/coreutils".parse().unwrap();
    assert_eq!(q.category, "sys-apps");
    assert_eq!(q.package, "coreutils");
    assert_eq!(q.to_string(), "sys-apps/coreutils");

    assert!("no-slash".parse::<QualifiedPackageName>().is_err());
    assert!("a/b/c".parse::<QualifiedPackageName>().is_err());
}

#[rstest]
fn test_qualified_package_name_ordering() {
    let a = crate::qpn!("cat-a/pkg");
    let b = crate::qpn!("cat-b/pkg");
    let c = crate::qpn!("cat-b/zpkg");
    assert!(a < b);
    assert!(b < c);
}
