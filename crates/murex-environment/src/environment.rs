// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use murex_depspec::SetSpec;
use murex_foundation::name::{
    KeywordNameBuf,
    PackageNamePart,
    QualifiedPackageName,
    RepositoryName,
    SetName,
};
use murex_id::{Mask, PackageID, PackageIDComparator};
use murex_repository::Repository;

use crate::error::{Error, Result};
use crate::hooks::{Hook, HookResult};

/// The user's view of the world: repositories, preferences, sets and
/// hooks.
///
/// Implementations are long-lived and shared; everything here may be
/// called from any thread.
pub trait Environment: Send + Sync {
    /// All repositories, most important first.
    fn repositories(&self) -> Vec<Arc<dyn Repository>>;

    fn repository(&self, name: &RepositoryName) -> Option<Arc<dyn Repository>> {
        self.repositories()
            .into_iter()
            .find(|r| *r.name() == *name)
    }

    /// Importance rank for ID ordering; higher wins.
    fn repository_importance(&self, name: &RepositoryName) -> u32;

    /// The filesystem root that installed repositories install to.
    fn root(&self) -> &Path;

    /// The user's opinion on a choice flag for this ID, if any.
    fn want_choice_enabled(
        &self,
        id: &dyn PackageID,
        choice: &murex_foundation::name::ChoiceNameWithPrefix,
    ) -> Option<bool>;

    /// The user's parameter value for a parameterised choice.
    fn value_for_choice_parameter(
        &self,
        _id: &dyn PackageID,
        _choice: &murex_foundation::name::ChoiceNameWithPrefix,
    ) -> Option<String> {
        None
    }

    fn accept_keywords(&self, keywords: &BTreeSet<KeywordNameBuf>, id: &dyn PackageID) -> bool;

    fn accept_license(&self, license: &str, id: &dyn PackageID) -> bool;

    /// A user-configured mask on this ID, if any.
    fn mask_for_user(&self, id: &dyn PackageID) -> Option<Mask>;

    /// True if the user explicitly unmasked this ID.
    fn unmasked_by_user(&self, id: &dyn PackageID) -> bool;

    /// Resolve a named set, merging repository and user definitions.
    fn set(&self, name: &SetName) -> Option<SetSpec>;

    /// Record a package in the world set. Returns false if it was
    /// already there.
    fn add_to_world(&self, name: &QualifiedPackageName) -> Result<bool>;

    /// Remove a package from the world set. Returns false if it was
    /// not there.
    fn remove_from_world(&self, name: &QualifiedPackageName) -> Result<bool>;

    fn perform_hook(&self, hook: &Hook) -> HookResult;
}

/// Build the standard ID comparator for an environment.
pub fn package_id_comparator(env: &dyn Environment) -> PackageIDComparator {
    PackageIDComparator::new(
        env.repositories()
            .into_iter()
            .map(|r| (r.name().to_owned(), env.repository_importance(r.name()))),
    )
}

/// Resolve a bare package name to its unique qualified form.
pub fn fetch_unique_qualified_package_name(
    env: &dyn Environment,
    package: &PackageNamePart,
) -> Result<QualifiedPackageName> {
    let mut found: BTreeSet<QualifiedPackageName> = BTreeSet::new();
    for repository in env.repositories() {
        for category in repository.category_names_containing_package(package) {
            found.insert(QualifiedPackageName::new(category, package.to_owned()));
        }
    }
    let mut iter = found.into_iter();
    match (iter.next(), iter.next()) {
        (None, _) => Err(Error::NoSuchPackage {
            query: package.to_string(),
        }),
        (Some(unique), None) => Ok(unique),
        (Some(first), Some(second)) => {
            let mut alternatives = vec![first, second];
            alternatives.extend(iter);
            Err(Error::AmbiguousPackageName {
                package: package.to_string(),
                alternatives,
            })
        }
    }
}

/// True if the ID lives in a repository that installs to the
/// environment's root.
pub fn is_installed_at_root(env: &dyn Environment, id: &dyn PackageID) -> bool {
    env.repository(id.repository_name())
        .and_then(|r| r.installed_root_key())
        .and_then(|key| key.as_path().map(Path::to_owned))
        .is_some_and(|root| root == env.root())
}
