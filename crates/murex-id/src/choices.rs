// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::sync::Arc;

use murex_foundation::name::{
    ChoiceNameWithPrefix,
    ChoiceNameWithPrefixBuf,
    ChoicePrefixName,
    ChoicePrefixNameBuf,
    UnprefixedChoiceNameBuf,
};

#[cfg(test)]
#[path = "./choices_test.rs"]
mod choices_test;

/// Where a choice value came from.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ChoiceOrigin {
    /// Declared by the package's metadata.
    Explicit,
    /// Synthesised, for example from a profile or the environment.
    Implicit,
}

/// Values a parameterised choice accepts.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PermittedChoiceValueParameterValues {
    /// Each entry is `(value, description)`.
    Enumeration(Vec<(String, String)>),
    IntegerRange {
        min: Option<i64>,
        max: Option<i64>,
    },
}

impl PermittedChoiceValueParameterValues {
    pub fn permits(&self, parameter: &str) -> bool {
        match self {
            PermittedChoiceValueParameterValues::Enumeration(values) => {
                values.iter().any(|(v, _)| v == parameter)
            }
            PermittedChoiceValueParameterValues::IntegerRange { min, max } => {
                let Ok(value) = parameter.parse::<i64>() else {
                    return false;
                };
                min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
            }
        }
    }
}

/// One value of a choice, for example `nls` or `linguas_en`.
#[derive(Debug, Clone)]
pub struct ChoiceValue {
    pub unprefixed_name: UnprefixedChoiceNameBuf,
    pub name_with_prefix: ChoiceNameWithPrefixBuf,
    pub enabled: bool,
    pub enabled_by_default: bool,
    pub locked: bool,
    pub description: String,
    pub origin: ChoiceOrigin,
    pub parameter: Option<String>,
    pub permitted_parameter_values: Option<PermittedChoiceValueParameterValues>,
}

impl ChoiceValue {
    /// A plain unlocked value with no parameter.
    pub fn simple(
        prefix: &ChoicePrefixName,
        unprefixed: UnprefixedChoiceNameBuf,
        enabled: bool,
    ) -> Self {
        let name_with_prefix = ChoiceNameWithPrefix::of(prefix, &unprefixed);
        Self {
            unprefixed_name: unprefixed,
            name_with_prefix,
            enabled,
            enabled_by_default: enabled,
            locked: false,
            description: String::new(),
            origin: ChoiceOrigin::Explicit,
            parameter: None,
            permitted_parameter_values: None,
        }
    }
}

/// A group of choice values sharing a prefix, for example USE or
/// LINGUAS.
#[derive(Debug, Clone)]
pub struct Choice {
    pub raw_name: String,
    pub human_name: String,
    pub prefix: ChoicePrefixNameBuf,
    pub hidden: bool,
    pub hide_description: bool,
    pub show_with_no_prefix: bool,
    /// True when any value name is considered part of this choice,
    /// as for `LINGUAS`-style expansions accepting arbitrary values.
    pub contains_every_value: bool,
    pub consider_added_or_changed: bool,
    values: Vec<Arc<ChoiceValue>>,
}

impl Choice {
    pub fn new(raw_name: impl Into<String>, human_name: impl Into<String>, prefix: ChoicePrefixNameBuf) -> Self {
        Self {
            raw_name: raw_name.into(),
            human_name: human_name.into(),
            prefix,
            hidden: false,
            hide_description: false,
            show_with_no_prefix: true,
            contains_every_value: false,
            consider_added_or_changed: true,
            values: Vec::new(),
        }
    }

    pub fn add(&mut self, value: ChoiceValue) {
        self.values.push(Arc::new(value));
    }

    pub fn values(&self) -> impl Iterator<Item = &Arc<ChoiceValue>> {
        self.values.iter()
    }
}

/// All the choices of one package, looked up by prefixed value name.
#[derive(Debug, Clone, Default)]
pub struct Choices {
    choices: Vec<Arc<Choice>>,
}

impl Choices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, choice: Arc<Choice>) {
        self.choices.push(choice);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Choice>> {
        self.choices.iter()
    }

    pub fn find(&self, prefix: &ChoicePrefixName) -> Option<&Arc<Choice>> {
        self.choices.iter().find(|c| *c.prefix == *prefix)
    }

    /// Find a value by its prefixed name across all choices.
    pub fn find_by_name_with_prefix(
        &self,
        name: &ChoiceNameWithPrefix,
    ) -> Option<Arc<ChoiceValue>> {
        for choice in &self.choices {
            for value in choice.values() {
                if *value.name_with_prefix == *name {
                    return Some(Arc::clone(value));
                }
            }
        }
        None
    }

    /// Find the choice whose prefix would own `name`, if that choice
    /// accepts every value name.
    pub fn find_matching_contains_every_value_prefix(
        &self,
        name: &ChoiceNameWithPrefix,
    ) -> Option<&Arc<Choice>> {
        self.choices.iter().filter(|c| c.contains_every_value).find(|c| {
            !c.prefix.is_empty() && name.starts_with(&format!("{}_", c.prefix))
        })
    }

    /// The prefixed names of every enabled value.
    pub fn enabled_names(&self) -> Vec<ChoiceNameWithPrefixBuf> {
        let mut out: Vec<_> = self
            .choices
            .iter()
            .flat_map(|c| c.values())
            .filter(|v| v.enabled)
            .map(|v| v.name_with_prefix.clone())
            .collect();
        out.sort();
        out
    }
}

/// The hidden `build_options` choice that every format backend
/// offers with the same value set.
pub fn standard_build_options() -> Choice {
    let prefix: ChoicePrefixNameBuf = "build_options"
        .parse()
        .expect("build_options is a valid prefix");
    let mut choice = Choice::new("build_options", "Build Options", prefix.clone());
    choice.hidden = true;
    choice.show_with_no_prefix = false;
    choice.consider_added_or_changed = false;
    for (name, description, enabled) in [
        ("optional_tests", "Run tests considered optional", false),
        ("recommended_tests", "Run tests considered recommended", true),
        ("split", "Split debugging information", true),
        ("strip", "Strip debugging information", true),
        ("preserve_work", "Do not remove the work directory", false),
        ("trace", "Trace the build with 'set -x'", false),
    ] {
        let unprefixed: UnprefixedChoiceNameBuf =
            name.parse().expect("standard names are valid");
        let mut value = ChoiceValue::simple(&prefix, unprefixed, enabled);
        value.description = description.to_string();
        value.origin = ChoiceOrigin::Implicit;
        choice.add(value);
    }
    choice
}
