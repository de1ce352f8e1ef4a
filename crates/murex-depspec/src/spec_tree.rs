// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! Spec tree node types.
//!
//! Each tree kind gets its own enum listing exactly the node variants
//! that are legal in it, so an illegal nesting cannot be represented.
//! The parser in [`crate::parse`] enforces the same rules while
//! reading text.

use std::fmt::Write;
use std::str::FromStr;

use murex_foundation::name::{ChoiceNameWithPrefixBuf, SetNameBuf};

use crate::error::{Error, Result, SpecTreeParseError};
use crate::package_dep_spec::{DepSpecAnnotations, PackageDepSpec};

/// A `flag?` or `!flag?` condition guarding a group.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ConditionalDepSpec {
    pub flag: ChoiceNameWithPrefixBuf,
    pub inverse: bool,
}

impl std::fmt::Display for ConditionalDepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.inverse {
            f.write_char('!')?;
        }
        write!(f, "{}?", self.flag)
    }
}

impl FromStr for ConditionalDepSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let body = s.strip_suffix('?').ok_or_else(|| {
            SpecTreeParseError::new_error(s, 0, "conditional must end in '?'")
        })?;
        let (body, inverse) = match body.strip_prefix('!') {
            Some(body) => (body, true),
            None => (body, false),
        };
        Ok(Self {
            flag: body.parse()?,
            inverse,
        })
    }
}

/// A `!spec` or `!!spec` block against matching installed packages.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BlockDepSpec {
    pub spec: PackageDepSpec,
    pub strong: bool,
}

impl std::fmt::Display for BlockDepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.strong { "!!" } else { "!" }, self.spec)
    }
}

/// A reference to a named set, `@name` in set files and dependencies.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct NamedSetDepSpec {
    pub name: SetNameBuf,
}

impl std::fmt::Display for NamedSetDepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.name)
    }
}

/// An uninterpreted token, as found in restrict and description trees.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PlainTextDepSpec {
    pub text: String,
    pub annotations: DepSpecAnnotations,
}

impl std::fmt::Display for PlainTextDepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)?;
        fmt_annotations(&self.annotations, f)
    }
}

/// A single license name.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct LicenseDepSpec {
    pub name: String,
    pub annotations: DepSpecAnnotations,
}

impl std::fmt::Display for LicenseDepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        fmt_annotations(&self.annotations, f)
    }
}

/// A URI with no associated fetch behaviour, as in homepages.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SimpleUriDepSpec {
    pub uri: String,
    pub annotations: DepSpecAnnotations,
}

impl std::fmt::Display for SimpleUriDepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)?;
        fmt_annotations(&self.annotations, f)
    }
}

/// A fetchable source URI, optionally renamed with `-> name`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct FetchableUriDepSpec {
    pub uri: String,
    pub rename: Option<String>,
    pub annotations: DepSpecAnnotations,
}

impl FetchableUriDepSpec {
    /// The file name the download is stored under.
    pub fn filename(&self) -> &str {
        match &self.rename {
            Some(name) => name,
            None => self.uri.rsplit('/').next().unwrap_or(&self.uri),
        }
    }
}

impl std::fmt::Display for FetchableUriDepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.rename {
            Some(name) => write!(f, "{} -> {name}", self.uri)?,
            None => f.write_str(&self.uri)?,
        }
        fmt_annotations(&self.annotations, f)
    }
}

/// The role a labelled group of dependencies plays.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DependencyLabel {
    Build,
    Run,
    Post,
    Suggestion,
    Recommendation,
    Test,
}

/// A `build:`-style label token changing the role of the
/// dependencies that follow it within the enclosing group.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct DependencyLabelsDepSpec {
    pub labels: Vec<DependencyLabel>,
}

impl std::fmt::Display for DependencyLabelsDepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_char('+')?;
            }
            label.fmt(f)?;
        }
        f.write_char(':')
    }
}

impl FromStr for DependencyLabelsDepSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let body = s
            .strip_suffix(':')
            .ok_or_else(|| SpecTreeParseError::new_error(s, 0, "label must end in ':'"))?;
        let labels = body
            .split('+')
            .map(|part| {
                part.parse::<DependencyLabel>().map_err(|_| {
                    SpecTreeParseError::new_error(s, 0, format!("unknown label '{part}'"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if labels.is_empty() {
            return Err(SpecTreeParseError::new_error(s, 0, "empty label"));
        }
        Ok(Self { labels })
    }
}

/// A `mirrors:`-style label token in a fetchable URI tree.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UriLabelsDepSpec {
    pub labels: Vec<String>,
}

impl std::fmt::Display for UriLabelsDepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_char('+')?;
            }
            f.write_str(label)?;
        }
        f.write_char(':')
    }
}

fn fmt_annotations(
    annotations: &DepSpecAnnotations,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    for (key, value) in annotations {
        write!(f, " [[ {key} = {value} ]]")?;
    }
    Ok(())
}

fn fmt_children<N: std::fmt::Display>(
    children: &[N],
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_char(' ')?;
        }
        child.fmt(f)?;
    }
    Ok(())
}

macro_rules! group_display {
    ($f:expr, $children:expr, $prefix:expr) => {{
        $f.write_str($prefix)?;
        $f.write_str("( ")?;
        fmt_children($children, $f)?;
        $f.write_str(" )")
    }};
}

/// Render a tree root: the outermost `All` prints without parens.
macro_rules! root_display {
    ($name:ident) => {
        impl $name {
            /// Render this node as a tree root, without the outermost
            /// parentheses.
            pub fn to_root_string(&self) -> String {
                match self {
                    $name::All(children) => {
                        let mut out = String::new();
                        for (i, child) in children.iter().enumerate() {
                            if i > 0 {
                                out.push(' ');
                            }
                            out.push_str(&child.to_string());
                        }
                        out
                    }
                    other => other.to_string(),
                }
            }
        }
    };
}

/// A node in a dependency tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DependencySpec {
    All(Vec<DependencySpec>),
    Any(Vec<DependencySpec>),
    Conditional(ConditionalDepSpec, Vec<DependencySpec>),
    Package(PackageDepSpec),
    Block(BlockDepSpec),
    Labels(DependencyLabelsDepSpec),
    NamedSet(NamedSetDepSpec),
}

root_display!(DependencySpec);

impl std::fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencySpec::All(children) => group_display!(f, children, ""),
            DependencySpec::Any(children) => group_display!(f, children, "|| "),
            DependencySpec::Conditional(cond, children) => {
                cond.fmt(f)?;
                f.write_char(' ')?;
                group_display!(f, children, "")
            }
            DependencySpec::Package(spec) => spec.fmt(f),
            DependencySpec::Block(spec) => spec.fmt(f),
            DependencySpec::Labels(labels) => labels.fmt(f),
            DependencySpec::NamedSet(set) => set.fmt(f),
        }
    }
}

/// A node in a license tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LicenseSpec {
    All(Vec<LicenseSpec>),
    Any(Vec<LicenseSpec>),
    Conditional(ConditionalDepSpec, Vec<LicenseSpec>),
    License(LicenseDepSpec),
}

root_display!(LicenseSpec);

impl std::fmt::Display for LicenseSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseSpec::All(children) => group_display!(f, children, ""),
            LicenseSpec::Any(children) => group_display!(f, children, "|| "),
            LicenseSpec::Conditional(cond, children) => {
                cond.fmt(f)?;
                f.write_char(' ')?;
                group_display!(f, children, "")
            }
            LicenseSpec::License(license) => license.fmt(f),
        }
    }
}

/// A node in a provides tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ProvideSpec {
    All(Vec<ProvideSpec>),
    Conditional(ConditionalDepSpec, Vec<ProvideSpec>),
    Package(PackageDepSpec),
}

root_display!(ProvideSpec);

impl std::fmt::Display for ProvideSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvideSpec::All(children) => group_display!(f, children, ""),
            ProvideSpec::Conditional(cond, children) => {
                cond.fmt(f)?;
                f.write_char(' ')?;
                group_display!(f, children, "")
            }
            ProvideSpec::Package(spec) => spec.fmt(f),
        }
    }
}

/// A node in a plain text tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PlainTextSpec {
    All(Vec<PlainTextSpec>),
    Conditional(ConditionalDepSpec, Vec<PlainTextSpec>),
    PlainText(PlainTextDepSpec),
}

root_display!(PlainTextSpec);

impl std::fmt::Display for PlainTextSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlainTextSpec::All(children) => group_display!(f, children, ""),
            PlainTextSpec::Conditional(cond, children) => {
                cond.fmt(f)?;
                f.write_char(' ')?;
                group_display!(f, children, "")
            }
            PlainTextSpec::PlainText(text) => text.fmt(f),
        }
    }
}

/// A node in a simple URI tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SimpleUriSpec {
    All(Vec<SimpleUriSpec>),
    Conditional(ConditionalDepSpec, Vec<SimpleUriSpec>),
    Uri(SimpleUriDepSpec),
}

root_display!(SimpleUriSpec);

impl std::fmt::Display for SimpleUriSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimpleUriSpec::All(children) => group_display!(f, children, ""),
            SimpleUriSpec::Conditional(cond, children) => {
                cond.fmt(f)?;
                f.write_char(' ')?;
                group_display!(f, children, "")
            }
            SimpleUriSpec::Uri(uri) => uri.fmt(f),
        }
    }
}

/// A node in a fetchable URI tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FetchableUriSpec {
    All(Vec<FetchableUriSpec>),
    Conditional(ConditionalDepSpec, Vec<FetchableUriSpec>),
    Uri(FetchableUriDepSpec),
    Labels(UriLabelsDepSpec),
}

root_display!(FetchableUriSpec);

impl std::fmt::Display for FetchableUriSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchableUriSpec::All(children) => group_display!(f, children, ""),
            FetchableUriSpec::Conditional(cond, children) => {
                cond.fmt(f)?;
                f.write_char(' ')?;
                group_display!(f, children, "")
            }
            FetchableUriSpec::Uri(uri) => uri.fmt(f),
            FetchableUriSpec::Labels(labels) => labels.fmt(f),
        }
    }
}

/// A node in a set contents tree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SetSpec {
    All(Vec<SetSpec>),
    Package(PackageDepSpec),
    NamedSet(NamedSetDepSpec),
}

root_display!(SetSpec);

impl std::fmt::Display for SetSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetSpec::All(children) => group_display!(f, children, ""),
            SetSpec::Package(spec) => spec.fmt(f),
            SetSpec::NamedSet(set) => set.fmt(f),
        }
    }
}

impl SetSpec {
    /// An empty set.
    pub fn empty() -> Self {
        SetSpec::All(Vec::new())
    }

    /// Iterate the package and named-set leaves of this tree.
    pub fn leaves(&self) -> Vec<&SetSpec> {
        let mut out = Vec::new();
        fn walk<'a>(node: &'a SetSpec, out: &mut Vec<&'a SetSpec>) {
            match node {
                SetSpec::All(children) => children.iter().for_each(|c| walk(c, out)),
                leaf => out.push(leaf),
            }
        }
        walk(self, &mut out);
        out
    }
}
