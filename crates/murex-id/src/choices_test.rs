// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::sync::Arc;

use murex_foundation::name::{ChoiceNameWithPrefix, ChoicePrefixName};
use rstest::rstest;

use super::*;

fn sample_choices() -> Choices {
    let use_prefix = ChoicePrefixName::unprefixed().to_owned();
    let mut use_choice = Choice::new("USE", "USE", use_prefix.clone());
    use_choice.add(ChoiceValue::simple(
        &use_prefix,
        "nls".parse().unwrap(),
        true,
    ));
    use_choice.add(ChoiceValue::simple(
        &use_prefix,
        "doc".parse().unwrap(),
        false,
    ));

    let linguas_prefix: murex_foundation::name::ChoicePrefixNameBuf =
        "linguas".parse().unwrap();
    let mut linguas = Choice::new("LINGUAS", "Languages", linguas_prefix.clone());
    linguas.contains_every_value = true;
    linguas.add(ChoiceValue::simple(
        &linguas_prefix,
        "en".parse().unwrap(),
        true,
    ));

    let mut choices = Choices::new();
    choices.add(Arc::new(use_choice));
    choices.add(Arc::new(linguas));
    choices
}

#[rstest]
fn test_find_by_name_with_prefix() {
    let choices = sample_choices();
    let nls = choices
        .find_by_name_with_prefix(ChoiceNameWithPrefix::new("nls").unwrap())
        .unwrap();
    assert!(nls.enabled);
    assert_eq!(nls.unprefixed_name, "nls");

    let en = choices
        .find_by_name_with_prefix(ChoiceNameWithPrefix::new("linguas_en").unwrap())
        .unwrap();
    assert_eq!(en.unprefixed_name, "en");

    assert!(choices
        .find_by_name_with_prefix(ChoiceNameWithPrefix::new("missing").unwrap())
        .is_none());
}

#[rstest]
fn test_lookup_matches_iteration() {
    let choices = sample_choices();
    for choice in choices.iter() {
        for value in choice.values() {
            let found = choices
                .find_by_name_with_prefix(&value.name_with_prefix)
                .unwrap();
            assert_eq!(found.name_with_prefix, value.name_with_prefix);
            assert_eq!(found.enabled, value.enabled);
        }
    }
}

#[rstest]
fn test_contains_every_value_prefix() {
    let choices = sample_choices();
    let name = ChoiceNameWithPrefix::new("linguas_fr").unwrap();
    let choice = choices
        .find_matching_contains_every_value_prefix(name)
        .unwrap();
    assert_eq!(choice.raw_name, "LINGUAS");

    assert!(choices
        .find_matching_contains_every_value_prefix(ChoiceNameWithPrefix::new("nls").unwrap())
        .is_none());
}

#[rstest]
fn test_enabled_names() {
    let names = sample_choices().enabled_names();
    assert_eq!(
        names.iter().map(|n| n.as_str()).collect::<Vec<_>>(),
        vec!["linguas_en", "nls"]
    );
}

#[rstest]
fn test_parameter_ranges() {
    let range = PermittedChoiceValueParameterValues::IntegerRange {
        min: Some(1),
        max: Some(8),
    };
    assert!(range.permits("4"));
    assert!(!range.permits("0"));
    assert!(!range.permits("nine"));

    let enumeration = PermittedChoiceValueParameterValues::Enumeration(vec![
        ("fast".to_string(), "Optimise for speed".to_string()),
        ("small".to_string(), "Optimise for size".to_string()),
    ]);
    assert!(enumeration.permits("fast"));
    assert!(!enumeration.permits("tiny"));
}

#[rstest]
fn test_standard_build_options() {
    let choice = standard_build_options();
    assert!(choice.hidden);
    let names: Vec<_> = choice
        .values()
        .map(|v| v.name_with_prefix.as_str().to_owned())
        .collect();
    assert!(names.contains(&"build_options_strip".to_string()));
    assert!(names.contains(&"build_options_optional_tests".to_string()));
}
