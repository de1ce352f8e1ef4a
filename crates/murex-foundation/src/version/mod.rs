// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

mod error;
mod operator;
pub mod parsing;

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

pub use error::{Error, Result};
use miette::Diagnostic;
pub use operator::{InvalidVersionOperatorError, VersionOperator};
use serde::{Deserialize, Serialize};
use thiserror::Error;


pub const VERSION_SEP: char = '.';
pub const SUFFIX_SEP: char = '_';
pub const REVISION_SEP: &str = "-r";

/// Denotes that an invalid version number was given.
#[derive(Diagnostic, Debug, Error)]
#[error("Invalid version: {message}")]
pub struct InvalidVersionError {
    pub message: String,
}

impl InvalidVersionError {
    pub fn new_error(msg: String) -> Error {
        Error::InvalidVersionError(Self { message: msg })
    }
}

/// A release suffix class, in ascending order of precedence below an
/// unsuffixed release.
///
/// The full ordering across versions is
/// `alpha < beta < pre < rc < (no suffix) < p`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SuffixKind {
    Alpha,
    Beta,
    Pre,
    Rc,
    P,
}

/// One `_kindN` suffix attached to a version.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Suffix {
    pub kind: SuffixKind,
    pub number: Option<u64>,
}

impl Suffix {
    fn number_or_zero(&self) -> u64 {
        self.number.unwrap_or(0)
    }
}

/// One dot-separated numeric component, kept as its source digits so
/// that leading-zero components can compare as strings.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct NumberPart(pub(crate) String);

impl NumberPart {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn has_leading_zero(&self) -> bool {
        self.0.starts_with('0')
    }

    /// The digits with trailing zeroes removed, the form in which
    /// leading-zero components compare and hash.
    fn fractional_form(&self) -> &str {
        self.0.trim_end_matches('0')
    }

    fn integer_cmp(&self, other: &Self) -> Ordering {
        let a = self.0.trim_start_matches('0');
        let b = other.0.trim_start_matches('0');
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

/// A parsed package version.
///
/// Comparison follows the ebuild rule: numeric components first (a
/// component with a leading zero compares as a fraction), then the
/// optional trailing letter, then the suffix sequence, then scm
/// status, then the revision. The original text is preserved so that
/// display round-trips.
#[derive(Debug, Clone)]
pub struct VersionSpec {
    text: String,
    numbers: Vec<NumberPart>,
    letter: Option<char>,
    suffixes: Vec<Suffix>,
    scm: bool,
    revision: Option<u64>,
}

impl VersionSpec {
    pub(crate) fn new(
        text: String,
        numbers: Vec<NumberPart>,
        letter: Option<char>,
        suffixes: Vec<Suffix>,
        scm: bool,
        revision: Option<u64>,
    ) -> Self {
        Self {
            text,
            numbers,
            letter,
            suffixes,
            scm,
            revision,
        }
    }

    pub fn numbers(&self) -> &[NumberPart] {
        &self.numbers
    }

    pub fn letter(&self) -> Option<char> {
        self.letter
    }

    pub fn suffixes(&self) -> &[Suffix] {
        &self.suffixes
    }

    /// True for `-scm` versions and for the bare `scm` version.
    pub fn is_scm(&self) -> bool {
        self.scm
    }

    fn is_pure_scm(&self) -> bool {
        self.scm && self.numbers.is_empty()
    }

    pub fn has_revision(&self) -> bool {
        self.revision.is_some()
    }

    /// The revision number, zero when none was given.
    pub fn revision_only(&self) -> u64 {
        self.revision.unwrap_or(0)
    }

    /// Compare everything except the revision component.
    pub fn cmp_ignoring_revision(&self, other: &Self) -> Ordering {
        self.cmp_components(other)
    }

    /// True if this version's text begins with `pattern`'s text at a
    /// component boundary, the `=*` operator rule.
    ///
    /// `1.2` is a component prefix of `1.2` and `1.2.3` but not of
    /// `1.20`.
    pub fn is_component_prefix_of(pattern: &Self, candidate: &Self) -> bool {
        let Some(rest) = candidate.text.strip_prefix(&pattern.text) else {
            return false;
        };
        match rest.chars().next() {
            None => true,
            Some(c) => matches!(c, '.' | '_' | '-'),
        }
    }

    fn cmp_components(&self, other: &Self) -> Ordering {
        match (self.is_pure_scm(), other.is_pure_scm()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        let mut numbers = self.numbers.iter().zip(other.numbers.iter());
        for (index, (a, b)) in numbers.by_ref().enumerate() {
            let cmp = if index == 0 {
                a.integer_cmp(b)
            } else if a.has_leading_zero() || b.has_leading_zero() {
                a.fractional_form().cmp(b.fractional_form())
            } else {
                a.integer_cmp(b)
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        // any remaining component, even a zero, sorts later
        match self.numbers.len().cmp(&other.numbers.len()) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match self.letter.cmp(&other.letter) {
            Ordering::Equal => {}
            ord => return ord,
        }

        match cmp_suffixes(&self.suffixes, &other.suffixes) {
            Ordering::Equal => {}
            ord => return ord,
        }

        self.scm.cmp(&other.scm)
    }
}

fn cmp_suffixes(a: &[Suffix], b: &[Suffix]) -> Ordering {
    let mut ai = a.iter();
    let mut bi = b.iter();
    loop {
        match (ai.next(), bi.next()) {
            (None, None) => return Ordering::Equal,
            (Some(x), None) => {
                // a release with a trailing _p sorts above the bare
                // release; any other trailing suffix sorts below it
                return if x.kind == SuffixKind::P {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
            }
            (None, Some(y)) => {
                return if y.kind == SuffixKind::P {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
            (Some(x), Some(y)) => {
                match x
                    .kind
                    .cmp(&y.kind)
                    .then_with(|| x.number_or_zero().cmp(&y.number_or_zero()))
                {
                    Ordering::Equal => continue,
                    ord => return ord,
                }
            }
        }
    }
}

impl Ord for VersionSpec {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_components(other)
            .then_with(|| self.revision_only().cmp(&other.revision_only()))
    }
}

impl PartialOrd for VersionSpec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionSpec {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionSpec {}

impl Hash for VersionSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for (index, part) in self.numbers.iter().enumerate() {
            if index > 0 && part.has_leading_zero() {
                part.fractional_form().hash(state);
            } else {
                part.0.trim_start_matches('0').hash(state);
            }
        }
        self.letter.hash(state);
        for suffix in &self.suffixes {
            suffix.kind.hash(state);
            suffix.number_or_zero().hash(state);
        }
        self.scm.hash(state);
        self.revision_only().hash(state);
    }
}

impl std::fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.text.fmt(f)
    }
}

impl FromStr for VersionSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_version(s)
    }
}

impl TryFrom<&str> for VersionSpec {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        parse_version(s)
    }
}

impl Serialize for VersionSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionSpec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a version string into a [`VersionSpec`].
pub fn parse_version<S: AsRef<str>>(s: S) -> Result<VersionSpec> {
    let input = s.as_ref();
    parsing::version_spec(input)
        .map_err(|err| InvalidVersionError::new_error(format!("{input}: {err}")))
}
