// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! The generator / filter / selection query algebra.
//!
//! A [`Generator`] produces candidate IDs, [`Filter`]s narrow them,
//! and a [`Selection`] decides how many survivors to return and in
//! what shape. Queries read as
//! `Selection::BestVersionOnly(Generator::Matches(..).filtered(Filter::NotMasked))`.

use std::sync::Arc;

use murex_depspec::PackageDepSpec;
use murex_foundation::name::{QualifiedPackageName, RepositoryNameBuf};
use murex_id::{ActionKind, PackageID, PackageIDKey};

use crate::environment::{is_installed_at_root, package_id_comparator, Environment};
use crate::error::{Error, Result};
use crate::match_package::{match_package, MatchPackageOptions};

#[cfg(test)]
#[path = "./selection_test.rs"]
mod selection_test;

/// Produces candidate IDs.
#[derive(Clone)]
pub enum Generator {
    All,
    InRepository(RepositoryNameBuf),
    Package(QualifiedPackageName),
    Matches(PackageDepSpec, MatchPackageOptions),
}

impl Generator {
    /// Attach a filter, forming a [`FilteredGenerator`].
    pub fn filtered(self, filter: Filter) -> FilteredGenerator {
        FilteredGenerator {
            generator: self,
            filters: vec![filter],
        }
    }

    pub fn unfiltered(self) -> FilteredGenerator {
        FilteredGenerator {
            generator: self,
            filters: Vec::new(),
        }
    }

    fn ids(&self, env: &dyn Environment) -> Vec<Arc<dyn PackageID>> {
        match self {
            Generator::All => all_ids(env, None),
            Generator::InRepository(name) => all_ids(env, Some(name)),
            Generator::Package(name) => env
                .repositories()
                .into_iter()
                .flat_map(|r| r.package_ids(name))
                .collect(),
            Generator::Matches(spec, options) => {
                let candidates = match spec.package_name() {
                    Some(name) => Generator::Package(name.clone()).ids(env),
                    None => all_ids(env, None),
                };
                candidates
                    .into_iter()
                    .filter(|id| match_package(env, spec, id.as_ref(), options))
                    .collect()
            }
        }
    }
}

fn all_ids(env: &dyn Environment, repository: Option<&RepositoryNameBuf>) -> Vec<Arc<dyn PackageID>> {
    let mut out = Vec::new();
    for repo in env.repositories() {
        if let Some(wanted) = repository {
            if *repo.name() != **wanted {
                continue;
            }
        }
        for category in repo.category_names() {
            for package in repo.package_names(category.as_ref()) {
                out.extend(repo.package_ids(&package));
            }
        }
    }
    out
}

/// Narrows candidate IDs.
#[derive(Clone)]
pub enum Filter {
    All,
    /// Only IDs from repositories installing to the environment root.
    InstalledAtRoot,
    SupportsAction(ActionKind),
    /// Drops IDs masked by their metadata, repository or the user,
    /// unless the user unmasked them.
    NotMasked,
}

impl Filter {
    fn allows(&self, env: &dyn Environment, id: &dyn PackageID) -> bool {
        match self {
            Filter::All => true,
            Filter::InstalledAtRoot => is_installed_at_root(env, id),
            Filter::SupportsAction(kind) => id.supports_action(*kind),
            Filter::NotMasked => {
                if env.unmasked_by_user(id) {
                    return true;
                }
                if env.mask_for_user(id).is_some() {
                    return false;
                }
                !id.is_masked()
            }
        }
    }
}

/// A generator plus its filters.
#[derive(Clone)]
pub struct FilteredGenerator {
    generator: Generator,
    filters: Vec<Filter>,
}

impl FilteredGenerator {
    pub fn and(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    fn ids(&self, env: &dyn Environment) -> Vec<Arc<dyn PackageID>> {
        self.generator
            .ids(env)
            .into_iter()
            .filter(|id| self.filters.iter().all(|f| f.allows(env, id.as_ref())))
            .collect()
    }
}

/// Shapes the survivors of a filtered generator into a result list.
#[derive(Clone)]
pub enum Selection {
    /// Every match, sorted ascending with the best last.
    AllVersionsSorted(FilteredGenerator),
    /// Every match, sorted, grouped so each `(name, slot)` run is
    /// contiguous.
    AllVersionsGroupedBySlot(FilteredGenerator),
    /// The single best match per package name.
    BestVersionOnly(FilteredGenerator),
    /// At most one match, any will do.
    SomeArbitraryVersion(FilteredGenerator),
    /// Exactly one match or an error.
    RequireExactlyOne(FilteredGenerator),
}

impl Selection {
    pub fn execute(&self, env: &dyn Environment) -> Result<Vec<Arc<dyn PackageID>>> {
        let comparator = package_id_comparator(env);
        let sort_and_dedup = |mut ids: Vec<Arc<dyn PackageID>>| {
            ids.sort_by(|a, b| comparator.compare(a.as_ref(), b.as_ref()));
            ids.dedup_by(|a, b| PackageIDKey::of(a.as_ref()) == PackageIDKey::of(b.as_ref()));
            ids
        };
        match self {
            Selection::AllVersionsSorted(fg) => Ok(sort_and_dedup(fg.ids(env))),
            Selection::AllVersionsGroupedBySlot(fg) => {
                let mut ids = sort_and_dedup(fg.ids(env));
                ids.sort_by(|a, b| {
                    a.name()
                        .cmp(b.name())
                        .then_with(|| a.slot().cmp(&b.slot()))
                        .then_with(|| comparator.compare(a.as_ref(), b.as_ref()))
                });
                Ok(ids)
            }
            Selection::BestVersionOnly(fg) => {
                let ids = sort_and_dedup(fg.ids(env));
                let mut best: Vec<Arc<dyn PackageID>> = Vec::new();
                for id in ids {
                    match best.last() {
                        Some(last) if last.name() == id.name() => {
                            *best.last_mut().expect("non-empty") = id;
                        }
                        _ => best.push(id),
                    }
                }
                Ok(best)
            }
            Selection::SomeArbitraryVersion(fg) => {
                Ok(fg.ids(env).into_iter().take(1).collect())
            }
            Selection::RequireExactlyOne(fg) => {
                let ids = sort_and_dedup(fg.ids(env));
                match ids.len() {
                    0 => Err(Error::NoSuchPackage {
                        query: "selection required exactly one match".to_string(),
                    }),
                    1 => Ok(ids),
                    _ => Err(Error::AmbiguousPackageName {
                        package: ids[0].name().to_string(),
                        alternatives: ids
                            .iter()
                            .map(|id| id.name().clone())
                            .collect(),
                    }),
                }
            }
        }
    }
}
