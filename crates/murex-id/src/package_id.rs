// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use murex_foundation::name::{
    QualifiedPackageName,
    RepositoryName,
    RepositoryNameBuf,
    SlotNameBuf,
};
use murex_foundation::version::VersionSpec;

use crate::action::{Action, ActionKind};
use crate::error::Result;
use crate::mask::Mask;
use crate::metadata_key::MetadataKey;

/// Conventional raw names for the well-known metadata keys.
pub mod key_names {
    pub const SLOT: &str = "SLOT";
    pub const KEYWORDS: &str = "KEYWORDS";
    pub const CHOICES: &str = "CHOICES";
    pub const BUILD_DEPENDENCIES: &str = "DEPEND";
    pub const RUN_DEPENDENCIES: &str = "RDEPEND";
    pub const POST_DEPENDENCIES: &str = "PDEPEND";
    pub const SUGGESTED_DEPENDENCIES: &str = "SDEPEND";
    pub const PROVIDE: &str = "PROVIDE";
    pub const HOMEPAGE: &str = "HOMEPAGE";
    pub const FETCHES: &str = "SRC_URI";
    pub const LICENSE: &str = "LICENSE";
    pub const CONTENTS: &str = "CONTENTS";
    pub const INSTALLED_TIME: &str = "INSTALLED_TIME";
    pub const FS_LOCATION: &str = "FS_LOCATION";
    pub const VIRTUAL_FOR: &str = "VIRTUAL_FOR";
    pub const SHORT_DESCRIPTION: &str = "DESCRIPTION";
    pub const LONG_DESCRIPTION: &str = "LONG_DESCRIPTION";
}

/// How much of an ID to render.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CanonicalForm {
    /// `cat/pkg-1.0:slot::repo`
    Full,
    /// `1.0`
    Version,
    /// `cat/pkg::repo`
    NoVersion,
}

/// One version of one package in one repository.
///
/// IDs are shared as `Arc<dyn PackageID>`; all methods take `&self`
/// and implementations must be safe to call from any thread.
pub trait PackageID: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &QualifiedPackageName;

    fn version(&self) -> &VersionSpec;

    /// The repository this ID belongs to, by name. The environment
    /// resolves names to repository instances, so IDs never hold a
    /// reference back to their owner.
    fn repository_name(&self) -> &RepositoryName;

    fn slot(&self) -> Option<SlotNameBuf>;

    /// Every metadata key this ID carries.
    fn metadata_keys(&self) -> Vec<Arc<MetadataKey>>;

    fn masks(&self) -> Vec<Mask>;

    fn supports_action(&self, kind: ActionKind) -> bool;

    fn perform_action(&self, action: &mut Action<'_>) -> Result<()>;

    /// Distinguishes IDs that share name, version, slot and
    /// repository, as format backends require.
    fn extra_hash_information(&self) -> u64 {
        0
    }

    fn find_metadata(&self, raw_name: &str) -> Option<Arc<MetadataKey>> {
        self.metadata_keys()
            .into_iter()
            .find(|k| k.raw_name() == raw_name)
    }

    fn slot_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::SLOT)
    }

    fn keywords_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::KEYWORDS)
    }

    fn choices_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::CHOICES)
    }

    fn build_dependencies_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::BUILD_DEPENDENCIES)
    }

    fn run_dependencies_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::RUN_DEPENDENCIES)
    }

    fn post_dependencies_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::POST_DEPENDENCIES)
    }

    fn suggested_dependencies_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::SUGGESTED_DEPENDENCIES)
    }

    fn provide_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::PROVIDE)
    }

    fn homepage_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::HOMEPAGE)
    }

    fn fetches_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::FETCHES)
    }

    fn license_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::LICENSE)
    }

    fn contents_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::CONTENTS)
    }

    fn installed_time_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::INSTALLED_TIME)
    }

    fn fs_location_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::FS_LOCATION)
    }

    fn virtual_for_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::VIRTUAL_FOR)
    }

    fn short_description_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::SHORT_DESCRIPTION)
    }

    fn long_description_key(&self) -> Option<Arc<MetadataKey>> {
        self.find_metadata(key_names::LONG_DESCRIPTION)
    }

    fn is_masked(&self) -> bool {
        !self.masks().is_empty()
    }

    fn canonical_form(&self, form: CanonicalForm) -> String {
        match form {
            CanonicalForm::Full => {
                let slot = self
                    .slot()
                    .map(|s| format!(":{s}"))
                    .unwrap_or_default();
                format!(
                    "{}-{}{}::{}",
                    self.name(),
                    self.version(),
                    slot,
                    self.repository_name()
                )
            }
            CanonicalForm::Version => self.version().to_string(),
            CanonicalForm::NoVersion => {
                format!("{}::{}", self.name(), self.repository_name())
            }
        }
    }
}

/// Equality across `dyn PackageID`: repository identity plus the
/// identifying tuple plus the extra hash.
pub fn package_ids_equal(a: &dyn PackageID, b: &dyn PackageID) -> bool {
    a.name() == b.name()
        && a.version() == b.version()
        && a.slot() == b.slot()
        && a.repository_name() == b.repository_name()
        && a.extra_hash_information() == b.extra_hash_information()
}

/// A key usable in hash maps and sets of IDs.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PackageIDKey {
    pub name: QualifiedPackageName,
    pub version: VersionSpec,
    pub slot: Option<SlotNameBuf>,
    pub repository: RepositoryNameBuf,
    pub extra: u64,
}

impl PackageIDKey {
    pub fn of(id: &dyn PackageID) -> Self {
        Self {
            name: id.name().clone(),
            version: id.version().clone(),
            slot: id.slot(),
            repository: id.repository_name().to_owned(),
            extra: id.extra_hash_information(),
        }
    }
}

/// Orders IDs by name, version, repository importance, then the
/// ID's own stable tiebreak.
///
/// The ordering is ascending with the most preferred ID last, so
/// selections can take the maximum.
pub struct PackageIDComparator {
    importance: HashMap<RepositoryNameBuf, u32>,
}

impl PackageIDComparator {
    /// Build from `(repository, importance)` pairs; higher importance
    /// wins.
    pub fn new(ranks: impl IntoIterator<Item = (RepositoryNameBuf, u32)>) -> Self {
        Self {
            importance: ranks.into_iter().collect(),
        }
    }

    fn importance_of(&self, id: &dyn PackageID) -> u32 {
        self.importance
            .get(id.repository_name())
            .copied()
            .unwrap_or(0)
    }

    pub fn compare(&self, a: &dyn PackageID, b: &dyn PackageID) -> Ordering {
        a.name()
            .cmp(b.name())
            .then_with(|| a.version().cmp(b.version()))
            .then_with(|| self.importance_of(a).cmp(&self.importance_of(b)))
            .then_with(|| a.extra_hash_information().cmp(&b.extra_hash_information()))
    }
}
