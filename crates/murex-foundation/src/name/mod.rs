// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

mod error;

pub use error::{Error, Result};

use std::borrow::Borrow;
use std::convert::TryFrom;
use std::str::FromStr;

use miette::Diagnostic;
use paste::paste;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
#[path = "./name_test.rs"]
mod name_test;

/// Parse a qualified `cat/pkg` name from a literal.
///
/// This will panic if the name is invalid,
/// and should only be used for testing.
///
/// ```
/// # #[macro_use] extern crate murex_foundation;
/// # fn main() {
/// qpn!("sys-apps/coreutils");
/// # }
/// ```
#[macro_export]
macro_rules! qpn {
    ($name:literal) => {
        $name
            .parse::<$crate::name::QualifiedPackageName>()
            .unwrap()
    };
}

/// Parse a slot name from a literal.
///
/// This will panic if the name is invalid,
/// and should only be used for testing.
#[macro_export]
macro_rules! slot_name {
    ($name:literal) => {
        $crate::name::SlotName::new($name).unwrap()
    };
}

/// The class of name that a validation error refers to.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NameKind {
    Category,
    Package,
    QualifiedPackage,
    Slot,
    Keyword,
    Repository,
    Set,
    ChoicePrefix,
    UnprefixedChoice,
    ChoiceNameWithPrefix,
}

/// Denotes that an invalid name was given.
#[derive(Diagnostic, Debug, Error)]
#[error("Invalid {kind} name: {message}")]
pub struct InvalidNameError {
    pub kind: NameKind,
    pub message: String,
}

impl InvalidNameError {
    pub fn new_error(kind: NameKind, msg: String) -> Error {
        Error::InvalidNameError(Self { kind, message: msg })
    }
}

/// Generate a pair of types to represent a name.
macro_rules! name {
    ($typ_name:ident, $owned_typ_name:ident, $comment:tt, $validate:ident) => {
        paste! {
            #[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
            #[doc = "A borrowed " $comment " name"]
            pub struct $typ_name(str);
        }

        paste! {
            #[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Deserialize, Serialize)]
            #[doc = "An owned " $comment " name"]
            pub struct $owned_typ_name(String);
        }

        impl $typ_name {
            paste! {
                #[doc = "Validate and wrap the given string as a `" $typ_name "`"]
                pub fn new<S: AsRef<str> + ?Sized>(s: &S) -> Result<&$typ_name> {
                    $validate(s)?;
                    // Safety: from_str bypasses validation but we've just done that
                    Ok(unsafe { Self::from_str(s.as_ref()) })
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            paste! {
                #[doc = "Wrap a str as a `" $typ_name "`"]
                #[doc = ""]
                #[doc = "# Safety:"]
                #[doc = ""]
                #[doc = "This function bypasses validation and should not be used"]
                #[doc = "unless the given argument is known to be valid"]
                pub(crate) const unsafe fn from_str(inner: &str) -> &Self {
                    unsafe { &*(inner as *const str as *const $typ_name) }
                }
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }
        }

        impl $owned_typ_name {
            paste! {
                #[doc = "Consume the `" $owned_typ_name "`, returning the inner `String`."]
                pub fn into_inner(self) -> String {
                    self.0
                }
            }
        }

        impl std::borrow::Borrow<$typ_name> for $owned_typ_name {
            fn borrow(&self) -> &$typ_name {
                self.as_ref()
            }
        }

        impl std::borrow::Borrow<String> for $owned_typ_name {
            fn borrow(&self) -> &String {
                &self.0
            }
        }

        impl std::borrow::ToOwned for $typ_name {
            type Owned = $owned_typ_name;

            fn to_owned(&self) -> Self::Owned {
                $owned_typ_name(self.0.to_owned())
            }
        }

        impl std::cmp::PartialEq<$typ_name> for $owned_typ_name {
            fn eq(&self, other: &$typ_name) -> bool {
                &**self == other
            }
        }

        impl std::cmp::PartialEq<$owned_typ_name> for $typ_name {
            fn eq(&self, other: &$owned_typ_name) -> bool {
                &self.0 == other.as_str()
            }
        }

        impl std::cmp::PartialEq<str> for $typ_name {
            fn eq(&self, other: &str) -> bool {
                self.as_str() == other
            }
        }

        impl std::cmp::PartialEq<str> for $owned_typ_name {
            fn eq(&self, other: &str) -> bool {
                &**self == other
            }
        }

        impl std::cmp::PartialEq<&str> for $owned_typ_name {
            fn eq(&self, other: &&str) -> bool {
                &**self == *other
            }
        }

        impl std::convert::AsRef<$typ_name> for $typ_name {
            fn as_ref(&self) -> &$typ_name {
                self
            }
        }

        impl std::convert::AsRef<$typ_name> for $owned_typ_name {
            fn as_ref(&self) -> &$typ_name {
                // Safety: from_str bypasses validation but the contents
                // of an owned instance must already be valid
                unsafe { $typ_name::from_str(&self.0) }
            }
        }

        impl std::convert::AsRef<std::ffi::OsStr> for $typ_name {
            fn as_ref(&self) -> &std::ffi::OsStr {
                std::ffi::OsStr::new(&self.0)
            }
        }

        impl std::convert::AsRef<std::path::Path> for $typ_name {
            fn as_ref(&self) -> &std::path::Path {
                std::path::Path::new(&self.0)
            }
        }

        impl std::convert::AsRef<std::path::Path> for $owned_typ_name {
            fn as_ref(&self) -> &std::path::Path {
                std::path::Path::new(&self.0)
            }
        }

        impl std::convert::AsRef<str> for $owned_typ_name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::convert::From<&$typ_name> for $owned_typ_name {
            fn from(name: &$typ_name) -> Self {
                name.to_owned()
            }
        }

        impl std::convert::From<$owned_typ_name> for String {
            fn from(val: $owned_typ_name) -> Self {
                val.0
            }
        }

        impl std::convert::TryFrom<&str> for $owned_typ_name {
            type Error = $crate::name::Error;

            fn try_from(s: &str) -> Result<Self> {
                s.parse()
            }
        }

        impl std::convert::TryFrom<String> for $owned_typ_name {
            type Error = $crate::name::Error;

            fn try_from(s: String) -> Result<Self> {
                $validate(&s)?;
                Ok(Self(s))
            }
        }

        impl std::ops::Deref for $typ_name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::Deref for $owned_typ_name {
            type Target = $typ_name;

            fn deref(&self) -> &Self::Target {
                self.as_ref()
            }
        }

        impl std::fmt::Display for $typ_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::fmt::Display for $owned_typ_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $owned_typ_name {
            type Err = $crate::name::Error;

            fn from_str(s: &str) -> Result<Self> {
                $typ_name::new(&s).map(std::borrow::ToOwned::to_owned)
            }
        }
    };
    ($typ_name:ident, $comment:tt, $validate:ident) => {
        paste! {
            name!($typ_name, [<$typ_name Buf>], $comment, $validate);
        }
    };
}

name!(CategoryName, "category", validate_category_name);
name!(PackageNamePart, "package", validate_package_name_part);
name!(SlotName, "slot", validate_slot_name);
name!(KeywordName, "keyword", validate_keyword_name);
name!(RepositoryName, "repository", validate_repository_name);
name!(SetName, "set", validate_set_name);
name!(ChoicePrefixName, "choice prefix", validate_choice_prefix_name);
name!(UnprefixedChoiceName, "unprefixed choice", validate_unprefixed_choice_name);
name!(ChoiceNameWithPrefix, "prefixed choice", validate_choice_name_with_prefix);

fn is_name_head_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn check_name_chars<V>(
    kind: NameKind,
    name: &str,
    head: impl Fn(char) -> bool,
    tail: V,
) -> Result<()>
where
    V: Fn(char) -> bool,
{
    let mut chars = name.chars();
    match chars.next() {
        None => {
            return Err(InvalidNameError::new_error(
                kind,
                "name must not be empty".to_string(),
            ))
        }
        Some(c) if !head(c) => {
            return Err(InvalidNameError::new_error(
                kind,
                format!("invalid first character '{c}' in '{name}'"),
            ))
        }
        Some(_) => {}
    }
    for (i, c) in chars.enumerate() {
        if !tail(c) {
            return Err(InvalidNameError::new_error(
                kind,
                format!("invalid character '{c}' at position {} in '{name}'", i + 1),
            ));
        }
    }
    Ok(())
}

/// Ensure that the provided string is a valid category name.
fn validate_category_name<S: AsRef<str>>(name: S) -> Result<()> {
    check_name_chars(NameKind::Category, name.as_ref(), is_name_head_char, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-')
    })
}

/// Ensure that the provided string is a valid package name part.
///
/// A package name may not end in a hyphen followed by something
/// that reads as a version, since `pkg-1.2` must always split
/// unambiguously into a name and a version.
fn validate_package_name_part<S: AsRef<str>>(name: S) -> Result<()> {
    let name = name.as_ref();
    check_name_chars(NameKind::Package, name, is_name_head_char, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '-')
    })?;
    if let Some((_, tail)) = name.rsplit_once('-') {
        if tail.parse::<crate::version::VersionSpec>().is_ok() {
            return Err(InvalidNameError::new_error(
                NameKind::Package,
                format!("'{name}' ends in a hyphen followed by a version"),
            ));
        }
    }
    Ok(())
}

/// Ensure that the provided string is a valid slot name.
fn validate_slot_name<S: AsRef<str>>(name: S) -> Result<()> {
    check_name_chars(NameKind::Slot, name.as_ref(), is_name_head_char, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-')
    })
}

/// Ensure that the provided string is a valid keyword name.
///
/// `*` and `-*` are valid as whole keywords; otherwise an optional
/// leading `~` or `-` is followed by a word.
fn validate_keyword_name<S: AsRef<str>>(name: S) -> Result<()> {
    let name = name.as_ref();
    if name == "*" || name == "-*" {
        return Ok(());
    }
    let body = name.strip_prefix(['~', '-']).unwrap_or(name);
    check_name_chars(NameKind::Keyword, body, is_name_head_char, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
    })
}

/// Ensure that the provided string is a valid repository name.
fn validate_repository_name<S: AsRef<str>>(name: S) -> Result<()> {
    check_name_chars(NameKind::Repository, name.as_ref(), is_name_head_char, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-')
    })
}

/// Ensure that the provided string is a valid set name.
///
/// A single trailing `*` selects the set's "star" operator mode and
/// is valid; `**` is not.
fn validate_set_name<S: AsRef<str>>(name: S) -> Result<()> {
    let name = name.as_ref();
    let base = name.strip_suffix('*').unwrap_or(name);
    if base.ends_with('*') {
        return Err(InvalidNameError::new_error(
            NameKind::Set,
            format!("'{name}' has more than one trailing '*'"),
        ));
    }
    check_name_chars(NameKind::Set, base, is_name_head_char, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-')
    })
}

/// Ensure that the provided string is a valid choice prefix name.
fn validate_choice_prefix_name<S: AsRef<str>>(name: S) -> Result<()> {
    check_name_chars(
        NameKind::ChoicePrefix,
        name.as_ref(),
        |c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_',
        |c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_',
    )
}

fn is_choice_head_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '@'
}

fn is_choice_tail_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '@' | '.' | '-')
}

/// Ensure that the provided string is a valid unprefixed choice name.
fn validate_unprefixed_choice_name<S: AsRef<str>>(name: S) -> Result<()> {
    check_name_chars(
        NameKind::UnprefixedChoice,
        name.as_ref(),
        is_choice_head_char,
        is_choice_tail_char,
    )
}

/// Ensure that the provided string is a valid prefixed choice name.
fn validate_choice_name_with_prefix<S: AsRef<str>>(name: S) -> Result<()> {
    check_name_chars(
        NameKind::ChoiceNameWithPrefix,
        name.as_ref(),
        is_choice_head_char,
        is_choice_tail_char,
    )
}

impl SetName {
    /// The name without any trailing star-mode marker.
    pub fn base_name(&self) -> &SetName {
        match self.0.strip_suffix('*') {
            // Safety: from_str skips validation, but the base of a
            // valid set name is itself a valid set name
            Some(base) => unsafe { SetName::from_str(base) },
            None => self,
        }
    }

    /// True if this name carries the trailing `*` operator marker.
    pub fn is_star_mode(&self) -> bool {
        self.0.ends_with('*')
    }
}

impl SetNameBuf {
    /// Return this name with the trailing `*` operator marker added.
    pub fn with_star(&self) -> SetNameBuf {
        if self.is_star_mode() {
            self.clone()
        } else {
            SetNameBuf(format!("{}*", self.0))
        }
    }
}

impl ChoicePrefixName {
    /// The empty prefix used by the plain, unprefixed choice group.
    pub const fn unprefixed() -> &'static Self {
        // Safety: from_str skips validation; the empty prefix is the
        // one deliberate exception to the validation rule
        unsafe { Self::from_str("") }
    }
}

impl ChoiceNameWithPrefix {
    /// Join a prefix and an unprefixed value into the prefixed form.
    ///
    /// An empty prefix yields the value name unchanged.
    pub fn of(prefix: &ChoicePrefixName, value: &UnprefixedChoiceName) -> ChoiceNameWithPrefixBuf {
        if prefix.is_empty() {
            ChoiceNameWithPrefixBuf(value.as_str().to_owned())
        } else {
            ChoiceNameWithPrefixBuf(format!("{prefix}_{value}"))
        }
    }
}

impl RepositoryNameBuf {
    /// Return if this name refers to the conventional installed repository.
    pub fn is_installed(&self) -> bool {
        self.0 == "installed"
    }
}

/// A (category, package) pair naming a package across all versions.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct QualifiedPackageName {
    pub category: CategoryNameBuf,
    pub package: PackageNamePartBuf,
}

impl QualifiedPackageName {
    pub fn new(category: CategoryNameBuf, package: PackageNamePartBuf) -> Self {
        Self { category, package }
    }
}

impl std::fmt::Display for QualifiedPackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.package)
    }
}

impl FromStr for QualifiedPackageName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (cat, pkg) = s.split_once('/').ok_or_else(|| {
            InvalidNameError::new_error(
                NameKind::QualifiedPackage,
                format!("'{s}' is not of the form 'category/package'"),
            )
        })?;
        if pkg.contains('/') {
            return Err(InvalidNameError::new_error(
                NameKind::QualifiedPackage,
                format!("'{s}' has more than one '/'"),
            ));
        }
        Ok(Self {
            category: cat.parse()?,
            package: pkg.parse()?,
        })
    }
}

impl TryFrom<&str> for QualifiedPackageName {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl Serialize for QualifiedPackageName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QualifiedPackageName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Borrow<CategoryName> for QualifiedPackageName {
    fn borrow(&self) -> &CategoryName {
        self.category.as_ref()
    }
}
