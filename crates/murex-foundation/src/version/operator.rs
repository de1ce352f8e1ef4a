// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::cmp::Ordering;
use std::str::FromStr;

use miette::Diagnostic;
use thiserror::Error as ThisError;

use super::{Error, Result, VersionSpec};

#[cfg(test)]
#[path = "./operator_test.rs"]
mod operator_test;

/// Denotes that an invalid version operator was given.
#[derive(Diagnostic, Debug, ThisError)]
#[error("Invalid version operator: {message}")]
pub struct InvalidVersionOperatorError {
    pub message: String,
}

impl InvalidVersionOperatorError {
    pub fn new_error(msg: String) -> Error {
        Error::InvalidVersionOperatorError(Self { message: msg })
    }
}

/// An operator attached to a version requirement.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum VersionOperator {
    Less,
    LessOrEqual,
    Equal,
    /// `~`: equal, ignoring either side's revision.
    EqualIgnoringRevision,
    GreaterOrEqual,
    Greater,
    /// `=*`: the candidate's text begins with the pattern's text at a
    /// component boundary.
    EqualStarPrefix,
}

impl VersionOperator {
    /// All operators, longest spelling first for greedy parsing.
    pub const ALL: &'static [VersionOperator] = &[
        VersionOperator::LessOrEqual,
        VersionOperator::GreaterOrEqual,
        VersionOperator::EqualStarPrefix,
        VersionOperator::Less,
        VersionOperator::Greater,
        VersionOperator::EqualIgnoringRevision,
        VersionOperator::Equal,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            VersionOperator::Less => "<",
            VersionOperator::LessOrEqual => "<=",
            VersionOperator::Equal => "=",
            VersionOperator::EqualIgnoringRevision => "~",
            VersionOperator::GreaterOrEqual => ">=",
            VersionOperator::Greater => ">",
            VersionOperator::EqualStarPrefix => "=*",
        }
    }

    /// Return a comparator applying this operator.
    ///
    /// The first argument is the candidate version under test, the
    /// second the requirement's pattern version.
    pub fn as_version_spec_comparator(self) -> fn(&VersionSpec, &VersionSpec) -> bool {
        match self {
            VersionOperator::Less => |a, b| a.cmp(b) == Ordering::Less,
            VersionOperator::LessOrEqual => |a, b| a.cmp(b) != Ordering::Greater,
            VersionOperator::Equal => |a, b| a == b,
            VersionOperator::EqualIgnoringRevision => {
                |a, b| a.cmp_ignoring_revision(b) == Ordering::Equal
            }
            VersionOperator::GreaterOrEqual => |a, b| a.cmp(b) != Ordering::Less,
            VersionOperator::Greater => |a, b| a.cmp(b) == Ordering::Greater,
            VersionOperator::EqualStarPrefix => |a, b| VersionSpec::is_component_prefix_of(b, a),
        }
    }

    /// Evaluate this operator for a candidate against a pattern.
    pub fn compares(self, candidate: &VersionSpec, pattern: &VersionSpec) -> bool {
        self.as_version_spec_comparator()(candidate, pattern)
    }
}

impl std::fmt::Display for VersionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        VersionOperator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| {
                InvalidVersionOperatorError::new_error(format!("unknown operator '{s}'"))
            })
    }
}
