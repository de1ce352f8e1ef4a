// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use murex_depspec::SetSpec;
use murex_foundation::name::{
    CategoryName,
    CategoryNameBuf,
    PackageNamePart,
    QualifiedPackageName,
    RepositoryName,
    SetNameBuf,
};
use murex_id::{ActionKind, MetadataKey, PackageID};

/// What a repository is able to do beyond enumerating IDs.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RepositoryCapabilities {
    /// Can be the target of an install.
    pub destination: bool,
    /// Supplies mirror definitions.
    pub mirrors: bool,
    /// Carries fetch manifests.
    pub manifest: bool,
    /// Provides virtual packages.
    pub virtuals: bool,
    /// Creates virtual packages on demand.
    pub make_virtuals: bool,
    /// Answers environment variable queries for its IDs.
    pub environment_variable: bool,
}

/// A source of package IDs.
///
/// Instances are long-lived and shared; implementations guard any
/// caches internally so that all methods may be called from any
/// thread.
pub trait Repository: Send + Sync {
    fn name(&self) -> &RepositoryName;

    fn capabilities(&self) -> RepositoryCapabilities;

    fn category_names(&self) -> BTreeSet<CategoryNameBuf>;

    fn package_names(&self, category: &CategoryName) -> BTreeSet<QualifiedPackageName>;

    /// All IDs for a package, ordered by version ascending.
    fn package_ids(&self, name: &QualifiedPackageName) -> Vec<Arc<dyn PackageID>>;

    fn has_category_named(&self, category: &CategoryName) -> bool {
        self.category_names().iter().any(|c| **c == *category)
    }

    fn has_package_named(&self, name: &QualifiedPackageName) -> bool {
        !self.package_ids(name).is_empty()
    }

    fn category_names_containing_package(
        &self,
        package: &PackageNamePart,
    ) -> BTreeSet<CategoryNameBuf> {
        self.category_names()
            .into_iter()
            .filter(|c| {
                self.package_names(c.as_ref())
                    .iter()
                    .any(|q| q.package == *package)
            })
            .collect()
    }

    /// A cheap filter for action support across the whole repository.
    fn some_ids_might_support_action(&self, kind: ActionKind) -> bool;

    fn is_suitable_destination_for(&self, _id: &dyn PackageID) -> bool {
        false
    }

    /// The filesystem root of installed content, for installed
    /// repositories.
    fn installed_root_key(&self) -> Option<Arc<MetadataKey>> {
        None
    }

    fn format_key(&self) -> Option<Arc<MetadataKey>> {
        None
    }

    /// Keywords this repository's profile accepts by default.
    fn accept_keywords_key(&self) -> Option<Arc<MetadataKey>> {
        None
    }

    /// Named sets this repository contributes, such as `system`.
    fn sets(&self) -> BTreeMap<SetNameBuf, SetSpec> {
        BTreeMap::new()
    }
}
