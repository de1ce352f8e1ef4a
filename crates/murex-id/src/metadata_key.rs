// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use murex_depspec::{
    DependencySpec,
    FetchableUriSpec,
    LicenseSpec,
    PlainTextSpec,
    ProvideSpec,
    SimpleUriSpec,
};
use murex_foundation::name::{KeywordNameBuf, QualifiedPackageName};
use murex_foundation::version::VersionSpec;

use crate::choices::Choices;
use crate::contents::ContentsEntry;
use crate::mask::RepositoryMaskInfo;

/// How significant a key is when presenting a package.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MetadataKeyType {
    Significant,
    Normal,
    Dependencies,
    Author,
    Internal,
}

/// A structured reference to another package, as used by virtuals.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PackageRef {
    pub name: QualifiedPackageName,
    pub version: VersionSpec,
}

impl std::fmt::Display for PackageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

/// The typed payload of a metadata key.
#[derive(Debug, Clone)]
pub enum MetadataValue {
    Str(String),
    Path(PathBuf),
    Long(i64),
    Bool(bool),
    Time(SystemTime),
    StringSet(BTreeSet<String>),
    StringSequence(Vec<String>),
    Keywords(BTreeSet<KeywordNameBuf>),
    Choices(Arc<Choices>),
    MaskInfo(RepositoryMaskInfo),
    Contents(Vec<ContentsEntry>),
    PackageRef(PackageRef),
    Dependencies(DependencySpec),
    License(LicenseSpec),
    Provides(ProvideSpec),
    Fetches(FetchableUriSpec),
    SimpleUris(SimpleUriSpec),
    PlainTexts(PlainTextSpec),
    /// A nested group of keys.
    Section(Vec<Arc<MetadataKey>>),
}

/// Receives the typed payload of a key; one method per shape.
pub trait MetadataKeyVisitor {
    fn visit_str(&mut self, key: &MetadataKey, value: &str);
    fn visit_path(&mut self, key: &MetadataKey, value: &std::path::Path);
    fn visit_long(&mut self, key: &MetadataKey, value: i64);
    fn visit_bool(&mut self, key: &MetadataKey, value: bool);
    fn visit_time(&mut self, key: &MetadataKey, value: SystemTime);
    fn visit_string_set(&mut self, key: &MetadataKey, value: &BTreeSet<String>);
    fn visit_string_sequence(&mut self, key: &MetadataKey, value: &[String]);
    fn visit_keywords(&mut self, key: &MetadataKey, value: &BTreeSet<KeywordNameBuf>);
    fn visit_choices(&mut self, key: &MetadataKey, value: &Choices);
    fn visit_mask_info(&mut self, key: &MetadataKey, value: &RepositoryMaskInfo);
    fn visit_contents(&mut self, key: &MetadataKey, value: &[ContentsEntry]);
    fn visit_package_ref(&mut self, key: &MetadataKey, value: &PackageRef);
    fn visit_dependencies(&mut self, key: &MetadataKey, value: &DependencySpec);
    fn visit_license(&mut self, key: &MetadataKey, value: &LicenseSpec);
    fn visit_provides(&mut self, key: &MetadataKey, value: &ProvideSpec);
    fn visit_fetches(&mut self, key: &MetadataKey, value: &FetchableUriSpec);
    fn visit_simple_uris(&mut self, key: &MetadataKey, value: &SimpleUriSpec);
    fn visit_plain_texts(&mut self, key: &MetadataKey, value: &PlainTextSpec);
    fn visit_section(&mut self, key: &MetadataKey, value: &[Arc<MetadataKey>]);
}

/// One named, typed piece of package metadata.
///
/// The payload shape is fixed for the lifetime of the key.
#[derive(Debug, Clone)]
pub struct MetadataKey {
    raw_name: String,
    human_name: String,
    key_type: MetadataKeyType,
    value: MetadataValue,
}

impl MetadataKey {
    pub fn new(
        raw_name: impl Into<String>,
        human_name: impl Into<String>,
        key_type: MetadataKeyType,
        value: MetadataValue,
    ) -> Self {
        Self {
            raw_name: raw_name.into(),
            human_name: human_name.into(),
            key_type,
            value,
        }
    }

    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    pub fn human_name(&self) -> &str {
        &self.human_name
    }

    pub fn key_type(&self) -> MetadataKeyType {
        self.key_type
    }

    pub fn value(&self) -> &MetadataValue {
        &self.value
    }

    /// Dispatch on the payload shape.
    pub fn accept(&self, visitor: &mut dyn MetadataKeyVisitor) {
        match &self.value {
            MetadataValue::Str(v) => visitor.visit_str(self, v),
            MetadataValue::Path(v) => visitor.visit_path(self, v),
            MetadataValue::Long(v) => visitor.visit_long(self, *v),
            MetadataValue::Bool(v) => visitor.visit_bool(self, *v),
            MetadataValue::Time(v) => visitor.visit_time(self, *v),
            MetadataValue::StringSet(v) => visitor.visit_string_set(self, v),
            MetadataValue::StringSequence(v) => visitor.visit_string_sequence(self, v),
            MetadataValue::Keywords(v) => visitor.visit_keywords(self, v),
            MetadataValue::Choices(v) => visitor.visit_choices(self, v),
            MetadataValue::MaskInfo(v) => visitor.visit_mask_info(self, v),
            MetadataValue::Contents(v) => visitor.visit_contents(self, v),
            MetadataValue::PackageRef(v) => visitor.visit_package_ref(self, v),
            MetadataValue::Dependencies(v) => visitor.visit_dependencies(self, v),
            MetadataValue::License(v) => visitor.visit_license(self, v),
            MetadataValue::Provides(v) => visitor.visit_provides(self, v),
            MetadataValue::Fetches(v) => visitor.visit_fetches(self, v),
            MetadataValue::SimpleUris(v) => visitor.visit_simple_uris(self, v),
            MetadataValue::PlainTexts(v) => visitor.visit_plain_texts(self, v),
            MetadataValue::Section(v) => visitor.visit_section(self, v),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            MetadataValue::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&std::path::Path> {
        match &self.value {
            MetadataValue::Path(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<SystemTime> {
        match &self.value {
            MetadataValue::Time(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_keywords(&self) -> Option<&BTreeSet<KeywordNameBuf>> {
        match &self.value {
            MetadataValue::Keywords(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_choices(&self) -> Option<&Arc<Choices>> {
        match &self.value {
            MetadataValue::Choices(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_contents(&self) -> Option<&[ContentsEntry]> {
        match &self.value {
            MetadataValue::Contents(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dependencies(&self) -> Option<&DependencySpec> {
        match &self.value {
            MetadataValue::Dependencies(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_license(&self) -> Option<&LicenseSpec> {
        match &self.value {
            MetadataValue::License(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_provides(&self) -> Option<&ProvideSpec> {
        match &self.value {
            MetadataValue::Provides(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_fetches(&self) -> Option<&FetchableUriSpec> {
        match &self.value {
            MetadataValue::Fetches(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_package_ref(&self) -> Option<&PackageRef> {
        match &self.value {
            MetadataValue::PackageRef(v) => Some(v),
            _ => None,
        }
    }
}
