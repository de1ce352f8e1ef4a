// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::collections::BTreeMap;

/// A named event with string parameters, fired around interesting
/// operations such as merges.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Hook {
    pub name: String,
    pub vars: BTreeMap<String, String>,
}

impl Hook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

/// The combined outcome of every function run for a hook.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct HookResult {
    /// The worst exit status; zero means every function succeeded.
    pub max_exit_status: i32,
    pub output: Vec<String>,
}

impl HookResult {
    pub fn merge(&mut self, other: HookResult) {
        self.max_exit_status = self.max_exit_status.max(other.max_exit_status);
        self.output.extend(other.output);
    }
}

/// An in-process hook function.
pub type HookFn = Box<dyn Fn(&Hook) -> HookResult + Send + Sync>;
