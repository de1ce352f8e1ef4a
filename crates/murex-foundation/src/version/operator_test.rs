// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use rstest::rstest;

use super::super::parse_version;
use super::VersionOperator;

#[rstest]
#[case("<", VersionOperator::Less)]
#[case("<=", VersionOperator::LessOrEqual)]
#[case("=", VersionOperator::Equal)]
#[case("~", VersionOperator::EqualIgnoringRevision)]
#[case(">=", VersionOperator::GreaterOrEqual)]
#[case(">", VersionOperator::Greater)]
#[case("=*", VersionOperator::EqualStarPrefix)]
fn test_parse_and_display(#[case] text: &str, #[case] op: VersionOperator) {
    assert_eq!(text.parse::<VersionOperator>().unwrap(), op);
    assert_eq!(op.to_string(), text);
}

#[rstest]
fn test_parse_unknown() {
    assert!("==".parse::<VersionOperator>().is_err());
    assert!("".parse::<VersionOperator>().is_err());
}

#[rstest]
#[case("<", "1.0", "2.0", true)]
#[case("<", "2.0", "2.0", false)]
#[case("<=", "2.0", "2.0", true)]
#[case("=", "2.0", "2.0", true)]
#[case("=", "2.0-r1", "2.0", false)]
#[case("~", "2.0-r1", "2.0", true)]
#[case("~", "2.0-r1", "2.0-r2", true)]
#[case("~", "2.1", "2.0", false)]
#[case(">=", "2.0", "2.0", true)]
#[case(">", "2.0", "2.0", false)]
#[case(">", "2.1", "2.0", true)]
#[case("=*", "1.2.3", "1.2", true)]
#[case("=*", "1.20", "1.2", false)]
fn test_comparators(
    #[case] op: &str,
    #[case] candidate: &str,
    #[case] pattern: &str,
    #[case] expected: bool,
) {
    let op: VersionOperator = op.parse().unwrap();
    let candidate = parse_version(candidate).unwrap();
    let pattern = parse_version(pattern).unwrap();
    assert_eq!(op.compares(&candidate, &pattern), expected);
}
