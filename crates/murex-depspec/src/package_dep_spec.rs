// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use std::str::FromStr;

use murex_foundation::name::{
    CategoryNameBuf,
    ChoiceNameWithPrefixBuf,
    PackageNamePartBuf,
    QualifiedPackageName,
    RepositoryNameBuf,
    SlotNameBuf,
};
use murex_foundation::version::{VersionOperator, VersionSpec};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::options::ParseOptions;

#[cfg(test)]
#[path = "./package_dep_spec_test.rs"]
mod package_dep_spec_test;

/// Annotations attached to a spec via `[[ key = value ]]` blocks.
pub type DepSpecAnnotations = BTreeMap<String, String>;

/// The name portion of a package dep spec.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum NameConstraint {
    /// `cat/pkg`
    Qualified(QualifiedPackageName),
    /// `cat/*`
    InCategory(CategoryNameBuf),
    /// `*/pkg`
    NamedPackage(PackageNamePartBuf),
    /// `*/*`
    Any,
}

impl NameConstraint {
    /// The fully qualified name, when this constraint names one.
    pub fn exact(&self) -> Option<&QualifiedPackageName> {
        match self {
            NameConstraint::Qualified(q) => Some(q),
            _ => None,
        }
    }

    pub fn matches(&self, name: &QualifiedPackageName) -> bool {
        match self {
            NameConstraint::Qualified(q) => q == name,
            NameConstraint::InCategory(c) => *c == name.category,
            NameConstraint::NamedPackage(p) => *p == name.package,
            NameConstraint::Any => true,
        }
    }
}

impl std::fmt::Display for NameConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameConstraint::Qualified(q) => q.fmt(f),
            NameConstraint::InCategory(c) => write!(f, "{c}/*"),
            NameConstraint::NamedPackage(p) => write!(f, "*/{p}"),
            NameConstraint::Any => f.write_str("*/*"),
        }
    }
}

/// One `(operator, version)` requirement.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VersionRequirement {
    pub op: VersionOperator,
    pub version: VersionSpec,
}

impl VersionRequirement {
    pub fn new(op: VersionOperator, version: VersionSpec) -> Self {
        Self { op, version }
    }

    pub fn is_satisfied_by(&self, candidate: &VersionSpec) -> bool {
        self.op.compares(candidate, &self.version)
    }
}

impl std::fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.op {
            VersionOperator::EqualStarPrefix => write!(f, "={}*", self.version),
            op => write!(f, "{op}{}", self.version),
        }
    }
}

/// How multiple version requirements combine.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum VersionRequirementsMode {
    #[default]
    And,
    Or,
}

/// A `:slot` requirement.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum SlotRequirement {
    /// `:name`, `:name/sub`, `:name=`, `:name/sub=`
    Exact {
        name: SlotNameBuf,
        sub_slot: Option<SlotNameBuf>,
        locked: bool,
    },
    /// `:=` — any slot, rebuilt when the best slot changes.
    AnyLocked,
    /// `:*` — any slot at all.
    AnyUnlocked,
}

impl std::fmt::Display for SlotRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotRequirement::Exact {
                name,
                sub_slot,
                locked,
            } => {
                write!(f, ":{name}")?;
                if let Some(sub) = sub_slot {
                    write!(f, "/{sub}")?;
                }
                if *locked {
                    f.write_char('=')?;
                }
                Ok(())
            }
            SlotRequirement::AnyLocked => f.write_str(":="),
            SlotRequirement::AnyUnlocked => f.write_str(":*"),
        }
    }
}

/// The form of one `[use]` requirement.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ChoiceRequirementKind {
    /// `[foo]`
    Enabled,
    /// `[-foo]`
    Disabled,
    /// `[foo=]` — same state as on the spec's owner.
    EqualTo,
    /// `[foo?]` — enabled if enabled on the spec's owner.
    IfEnabled,
    /// `[!foo?]` — disabled if disabled on the spec's owner.
    IfDisabled,
}

/// One `[use]` requirement on a package dep spec.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ChoiceRequirement {
    pub name: ChoiceNameWithPrefixBuf,
    pub kind: ChoiceRequirementKind,
    /// `(+)` or `(-)`: the state assumed when the target does not
    /// know the flag at all.
    pub default_value: Option<bool>,
}

impl std::fmt::Display for ChoiceRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let default = match self.default_value {
            Some(true) => "(+)",
            Some(false) => "(-)",
            None => "",
        };
        match self.kind {
            ChoiceRequirementKind::Enabled => write!(f, "{}{default}", self.name),
            ChoiceRequirementKind::Disabled => write!(f, "-{}{default}", self.name),
            ChoiceRequirementKind::EqualTo => write!(f, "{}{default}=", self.name),
            ChoiceRequirementKind::IfEnabled => write!(f, "{}{default}?", self.name),
            ChoiceRequirementKind::IfDisabled => write!(f, "!{}{default}?", self.name),
        }
    }
}

/// One `[.key=value]` metadata key requirement.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct KeyRequirement {
    pub key: String,
    pub value: String,
}

impl std::fmt::Display for KeyRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ".{}={}", self.key, self.value)
    }
}

/// `::repo?` / `::repo??` — where the spec may be installed to.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct InstallableToRepository {
    pub repository: RepositoryNameBuf,
    pub include_masked: bool,
}

/// `::/path?` — a root the spec may be installed to.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct InstallableToPath {
    pub path: PathBuf,
    pub include_masked: bool,
}

/// An immutable constraint over package identities.
///
/// Construction is through [`PackageDepSpec::builder`] or by parsing
/// the canonical text form, which the [`std::fmt::Display`]
/// implementation reproduces.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PackageDepSpec {
    name_constraint: NameConstraint,
    version_requirements: Vec<VersionRequirement>,
    version_requirements_mode: VersionRequirementsMode,
    slot_requirement: Option<SlotRequirement>,
    in_repository: Option<RepositoryNameBuf>,
    from_repository: Option<RepositoryNameBuf>,
    installed_at_path: Option<PathBuf>,
    installable_to_repository: Option<InstallableToRepository>,
    installable_to_path: Option<InstallableToPath>,
    choice_requirements: Vec<ChoiceRequirement>,
    key_requirements: Vec<KeyRequirement>,
    annotations: DepSpecAnnotations,
}

impl PackageDepSpec {
    pub fn builder() -> PackageDepSpecBuilder {
        PackageDepSpecBuilder::default()
    }

    /// Parse the user-facing text form under the given dialect.
    pub fn parse(text: &str, options: &ParseOptions) -> Result<Self> {
        crate::parsing::parse_package_dep_spec(text, options)
    }

    pub fn name_constraint(&self) -> &NameConstraint {
        &self.name_constraint
    }

    /// The fully qualified package name, when this spec names one.
    pub fn package_name(&self) -> Option<&QualifiedPackageName> {
        self.name_constraint.exact()
    }

    pub fn version_requirements(&self) -> &[VersionRequirement] {
        &self.version_requirements
    }

    pub fn version_requirements_mode(&self) -> VersionRequirementsMode {
        self.version_requirements_mode
    }

    /// Evaluate all version requirements against a candidate version.
    pub fn version_requirements_satisfied_by(&self, candidate: &VersionSpec) -> bool {
        if self.version_requirements.is_empty() {
            return true;
        }
        match self.version_requirements_mode {
            VersionRequirementsMode::And => self
                .version_requirements
                .iter()
                .all(|r| r.is_satisfied_by(candidate)),
            VersionRequirementsMode::Or => self
                .version_requirements
                .iter()
                .any(|r| r.is_satisfied_by(candidate)),
        }
    }

    pub fn slot_requirement(&self) -> Option<&SlotRequirement> {
        self.slot_requirement.as_ref()
    }

    pub fn in_repository(&self) -> Option<&RepositoryNameBuf> {
        self.in_repository.as_ref()
    }

    pub fn from_repository(&self) -> Option<&RepositoryNameBuf> {
        self.from_repository.as_ref()
    }

    pub fn installed_at_path(&self) -> Option<&PathBuf> {
        self.installed_at_path.as_ref()
    }

    pub fn installable_to_repository(&self) -> Option<&InstallableToRepository> {
        self.installable_to_repository.as_ref()
    }

    pub fn installable_to_path(&self) -> Option<&InstallableToPath> {
        self.installable_to_path.as_ref()
    }

    pub fn choice_requirements(&self) -> &[ChoiceRequirement] {
        &self.choice_requirements
    }

    pub fn key_requirements(&self) -> &[KeyRequirement] {
        &self.key_requirements
    }

    pub fn annotations(&self) -> &DepSpecAnnotations {
        &self.annotations
    }

    pub(crate) fn set_annotations(&mut self, annotations: DepSpecAnnotations) {
        self.annotations = annotations;
    }

    /// A copy of this spec with only the name and slot constraints,
    /// as used when asking whether any version in a slot is present.
    pub fn to_name_and_slot_only(&self) -> PackageDepSpec {
        PackageDepSpec {
            name_constraint: self.name_constraint.clone(),
            version_requirements: Vec::new(),
            version_requirements_mode: VersionRequirementsMode::And,
            slot_requirement: self.slot_requirement.clone(),
            in_repository: None,
            from_repository: None,
            installed_at_path: None,
            installable_to_repository: None,
            installable_to_path: None,
            choice_requirements: Vec::new(),
            key_requirements: Vec::new(),
            annotations: DepSpecAnnotations::new(),
        }
    }
}

impl std::fmt::Display for PackageDepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // a single requirement renders in prefix form; several render
        // in the bracketed form they were written in
        let prefix_version = match self.version_requirements.as_slice() {
            [single] => Some(single),
            _ => None,
        };
        if let Some(req) = prefix_version {
            match req.op {
                VersionOperator::EqualStarPrefix => {
                    write!(f, "={}-{}*", self.name_constraint, req.version)?
                }
                op => write!(f, "{op}{}-{}", self.name_constraint, req.version)?,
            }
        } else {
            self.name_constraint.fmt(f)?;
        }

        if let Some(slot) = &self.slot_requirement {
            slot.fmt(f)?;
        }

        if let Some(path) = &self.installed_at_path {
            write!(f, "::{}", path.display())?;
        } else if let Some(to) = &self.installable_to_path {
            write!(
                f,
                "::{}{}",
                to.path.display(),
                if to.include_masked { "??" } else { "?" }
            )?;
        } else if let Some(from) = &self.from_repository {
            let to = self
                .installable_to_repository
                .as_ref()
                .map(|t| t.repository.as_str())
                .unwrap_or("");
            write!(f, "::{from}->{to}")?;
        } else if let Some(to) = &self.installable_to_repository {
            write!(
                f,
                "::{}{}",
                to.repository,
                if to.include_masked { "??" } else { "?" }
            )?;
        } else if let Some(repo) = &self.in_repository {
            write!(f, "::{repo}")?;
        }

        if prefix_version.is_none() && !self.version_requirements.is_empty() {
            let sep = match self.version_requirements_mode {
                VersionRequirementsMode::And => "&",
                VersionRequirementsMode::Or => "|",
            };
            f.write_char('[')?;
            for (i, req) in self.version_requirements.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                req.fmt(f)?;
            }
            f.write_char(']')?;
        }

        if !self.choice_requirements.is_empty() {
            f.write_char('[')?;
            for (i, req) in self.choice_requirements.iter().enumerate() {
                if i > 0 {
                    f.write_char(',')?;
                }
                req.fmt(f)?;
            }
            f.write_char(']')?;
        }

        for req in &self.key_requirements {
            write!(f, "[{req}]")?;
        }

        for (key, value) in &self.annotations {
            write!(f, " [[ {key} = {value} ]]")?;
        }

        Ok(())
    }
}

impl FromStr for PackageDepSpec {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, &ParseOptions::default())
    }
}

impl Serialize for PackageDepSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageDepSpec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Assembles a [`PackageDepSpec`] from parts.
#[derive(Debug, Default)]
pub struct PackageDepSpecBuilder {
    name_constraint: Option<NameConstraint>,
    version_requirements: Vec<VersionRequirement>,
    version_requirements_mode: VersionRequirementsMode,
    slot_requirement: Option<SlotRequirement>,
    in_repository: Option<RepositoryNameBuf>,
    from_repository: Option<RepositoryNameBuf>,
    installed_at_path: Option<PathBuf>,
    installable_to_repository: Option<InstallableToRepository>,
    installable_to_path: Option<InstallableToPath>,
    choice_requirements: Vec<ChoiceRequirement>,
    key_requirements: Vec<KeyRequirement>,
}

impl PackageDepSpecBuilder {
    pub fn package(mut self, name: QualifiedPackageName) -> Self {
        self.name_constraint = Some(NameConstraint::Qualified(name));
        self
    }

    pub fn any_package_in_category(mut self, category: CategoryNameBuf) -> Self {
        self.name_constraint = Some(NameConstraint::InCategory(category));
        self
    }

    pub fn any_category_for_package(mut self, package: PackageNamePartBuf) -> Self {
        self.name_constraint = Some(NameConstraint::NamedPackage(package));
        self
    }

    pub fn any_package(mut self) -> Self {
        self.name_constraint = Some(NameConstraint::Any);
        self
    }

    pub fn name_constraint(mut self, constraint: NameConstraint) -> Self {
        self.name_constraint = Some(constraint);
        self
    }

    pub fn version_requirement(mut self, op: VersionOperator, version: VersionSpec) -> Self {
        self.version_requirements
            .push(VersionRequirement::new(op, version));
        self
    }

    pub fn version_requirements_mode(mut self, mode: VersionRequirementsMode) -> Self {
        self.version_requirements_mode = mode;
        self
    }

    pub fn slot_requirement(mut self, slot: SlotRequirement) -> Self {
        self.slot_requirement = Some(slot);
        self
    }

    pub fn exact_slot(self, name: SlotNameBuf) -> Self {
        self.slot_requirement(SlotRequirement::Exact {
            name,
            sub_slot: None,
            locked: false,
        })
    }

    pub fn in_repository(mut self, repository: RepositoryNameBuf) -> Self {
        self.in_repository = Some(repository);
        self
    }

    pub fn from_repository(mut self, repository: RepositoryNameBuf) -> Self {
        self.from_repository = Some(repository);
        self
    }

    pub fn installed_at_path(mut self, path: PathBuf) -> Self {
        self.installed_at_path = Some(path);
        self
    }

    pub fn installable_to_repository(mut self, to: InstallableToRepository) -> Self {
        self.installable_to_repository = Some(to);
        self
    }

    pub fn installable_to_path(mut self, to: InstallableToPath) -> Self {
        self.installable_to_path = Some(to);
        self
    }

    pub fn choice_requirement(mut self, requirement: ChoiceRequirement) -> Self {
        self.choice_requirements.push(requirement);
        self
    }

    pub fn key_requirement(mut self, requirement: KeyRequirement) -> Self {
        self.key_requirements.push(requirement);
        self
    }

    pub fn build(self) -> Result<PackageDepSpec> {
        let name_constraint = self.name_constraint.ok_or_else(|| {
            crate::error::Error::IncompleteSpec("no name constraint was set".to_string())
        })?;
        Ok(PackageDepSpec {
            name_constraint,
            version_requirements: self.version_requirements,
            version_requirements_mode: self.version_requirements_mode,
            slot_requirement: self.slot_requirement,
            in_repository: self.in_repository,
            from_repository: self.from_repository,
            installed_at_path: self.installed_at_path,
            installable_to_repository: self.installable_to_repository,
            installable_to_path: self.installable_to_path,
            choice_requirements: self.choice_requirements,
            key_requirements: self.key_requirements,
            annotations: DepSpecAnnotations::new(),
        })
    }
}
