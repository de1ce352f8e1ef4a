// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! The removal planner.
//!
//! Entries keep a "leaves last" invariant: whenever A depends on B,
//! A appears before B, so executing the list front to back never
//! removes a package while something still needing it remains.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use murex_depspec::{DependencySpec, SlotRequirement};
use murex_environment::{
    condition_met,
    match_package_in_set,
    Environment,
    Filter,
    Generator,
    MatchPackageOptions,
    Selection,
};
use murex_foundation::name::SetName;
use murex_id::{package_ids_equal, CanonicalForm, PackageID, PackageIDKey};

use crate::dep_tag::DepTag;
use crate::error::{Error, Result};

#[cfg(test)]
#[path = "./uninstall_list_test.rs"]
mod uninstall_list_test;

/// Why an entry is on the list.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum UninstallListEntryKind {
    /// Chosen for removal.
    Package,
    /// Chosen for removal, and is a virtual.
    Virtual,
    /// Still needed by something outside the removal set; removing
    /// the list would break it.
    Required,
}

pub struct UninstallListEntry {
    pub id: Arc<dyn PackageID>,
    pub kind: UninstallListEntryKind,
    pub tags: BTreeSet<DepTag>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UninstallListOptions {
    /// Also remove installed packages that depend on the targets.
    pub with_dependencies_included: bool,
    /// Record dependents as errors instead of removals.
    pub with_dependencies_as_errors: bool,
    /// Also remove dependencies of the targets that nothing else
    /// uses.
    pub with_unused_dependencies: bool,
}

/// The removal planner; see the module notes.
pub struct UninstallList<'env> {
    env: &'env dyn Environment,
    options: UninstallListOptions,
    list: Vec<UninstallListEntry>,
    dep_cache: HashMap<PackageIDKey, Vec<Arc<dyn PackageID>>>,
}

impl<'env> UninstallList<'env> {
    pub fn new(env: &'env dyn Environment, options: UninstallListOptions) -> Self {
        Self {
            env,
            options,
            list: Vec::new(),
            dep_cache: HashMap::new(),
        }
    }

    /// Add an installed ID for removal, pulling in dependents and
    /// unused dependencies as the options direct.
    pub fn add(&mut self, id: Arc<dyn PackageID>, tag: Option<DepTag>) {
        self.real_add(id, tag, false);
    }

    fn real_add(&mut self, id: Arc<dyn PackageID>, tag: Option<DepTag>, error: bool) {
        if let Some(existing) = self.position_of(id.as_ref()) {
            if let Some(tag) = tag {
                self.list[existing].tags.insert(tag);
            }
            return;
        }

        let kind = if error {
            UninstallListEntryKind::Required
        } else if id.virtual_for_key().is_some() {
            UninstallListEntryKind::Virtual
        } else {
            UninstallListEntryKind::Package
        };
        if !error || id.virtual_for_key().is_none() {
            self.push_entry(Arc::clone(&id), tag, kind);
        }

        if !error {
            // don't recurse errors, it gets horrid
            if self.options.with_dependencies_included {
                self.add_dependents_of(id.as_ref(), false);
            } else if self.options.with_dependencies_as_errors {
                self.add_dependents_of(id.as_ref(), true);
            }
        }

        self.move_to_end(id.as_ref());

        if self.options.with_unused_dependencies {
            self.add_unused_dependencies();
        }
    }

    /// Add every installed package not reachable from the world set.
    pub fn add_unused(&mut self) {
        let everything = self.collect_all_installed();
        let world = self.collect_world(&everything);

        let mut closure: Vec<Arc<dyn PackageID>> = world;
        let mut closure_keys: BTreeSet<PackageIDKey> = closure
            .iter()
            .map(|id| PackageIDKey::of(id.as_ref()))
            .collect();
        loop {
            let depped = self.collect_depped_upon(&closure);
            let mut grew = false;
            for id in depped {
                if closure_keys.insert(PackageIDKey::of(id.as_ref())) {
                    closure.push(id);
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }

        let unused: Vec<Arc<dyn PackageID>> = everything
            .iter()
            .filter(|id| !closure_keys.contains(&PackageIDKey::of(id.as_ref())))
            .cloned()
            .collect();

        for id in self.order_dependents_first(unused) {
            let kind = if id.virtual_for_key().is_some() {
                UninstallListEntryKind::Virtual
            } else {
                UninstallListEntryKind::Package
            };
            self.push_entry(id, None, kind);
        }
    }

    /// True when the list contains `Required` entries and must not
    /// be executed.
    pub fn has_errors(&self) -> bool {
        self.list
            .iter()
            .any(|entry| entry.kind == UninstallListEntryKind::Required)
    }

    /// Fail unless the list is executable.
    pub fn check_executable(&self) -> Result<()> {
        if self.has_errors() {
            Err(Error::UninstallListHasErrors)
        } else {
            Ok(())
        }
    }

    pub fn entries(&self) -> &[UninstallListEntry] {
        &self.list
    }

    fn position_of(&self, id: &dyn PackageID) -> Option<usize> {
        self.list
            .iter()
            .position(|entry| package_ids_equal(entry.id.as_ref(), id))
    }

    fn push_entry(&mut self, id: Arc<dyn PackageID>, tag: Option<DepTag>, kind: UninstallListEntryKind) {
        tracing::debug!(
            id = %id.canonical_form(CanonicalForm::Full),
            kind = ?kind,
            "adding to uninstall list"
        );
        let mut tags = BTreeSet::new();
        if let Some(tag) = tag {
            tags.insert(tag);
        }
        self.list.push(UninstallListEntry { id, kind, tags });
    }

    fn move_to_end(&mut self, id: &dyn PackageID) {
        if let Some(position) = self.position_of(id) {
            let entry = self.list.remove(position);
            self.list.push(entry);
        }
    }

    fn collect_all_installed(&self) -> Vec<Arc<dyn PackageID>> {
        Selection::AllVersionsSorted(Generator::All.filtered(Filter::InstalledAtRoot))
            .execute(self.env)
            .unwrap_or_default()
    }

    /// Installed packages matched by the world set.
    fn collect_world(&self, everything: &[Arc<dyn PackageID>]) -> Vec<Arc<dyn PackageID>> {
        let Some(world) = self
            .env
            .set(SetName::new("world").expect("world is a valid set name"))
        else {
            return Vec::new();
        };
        everything
            .iter()
            .filter(|id| {
                match_package_in_set(
                    self.env,
                    &world,
                    id.as_ref(),
                    &MatchPackageOptions::default(),
                )
            })
            .cloned()
            .collect()
    }

    /// Installed packages that the targets' dependency trees match.
    fn collect_depped_upon(&mut self, targets: &[Arc<dyn PackageID>]) -> Vec<Arc<dyn PackageID>> {
        let mut out: Vec<Arc<dyn PackageID>> = Vec::new();
        let mut seen: BTreeSet<PackageIDKey> = BTreeSet::new();
        for target in targets {
            let key = PackageIDKey::of(target.as_ref());
            let matches = match self.dep_cache.get(&key) {
                Some(cached) => cached.clone(),
                None => {
                    let computed = self.compute_depped_upon(target);
                    self.dep_cache.insert(key, computed.clone());
                    computed
                }
            };
            for id in matches {
                if seen.insert(PackageIDKey::of(id.as_ref())) {
                    out.push(id);
                }
            }
        }
        out
    }

    fn compute_depped_upon(&self, target: &Arc<dyn PackageID>) -> Vec<Arc<dyn PackageID>> {
        let mut matches = Vec::new();
        let keys = [
            target.build_dependencies_key(),
            target.run_dependencies_key(),
            target.post_dependencies_key(),
            target.suggested_dependencies_key(),
        ];
        for key in keys.into_iter().flatten() {
            if let Some(tree) = key.as_dependencies() {
                self.collect_tree_matches(target, tree, &mut matches);
            }
        }
        matches
    }

    fn collect_tree_matches(
        &self,
        owner: &Arc<dyn PackageID>,
        tree: &DependencySpec,
        out: &mut Vec<Arc<dyn PackageID>>,
    ) {
        match tree {
            DependencySpec::All(children) | DependencySpec::Any(children) => {
                for child in children {
                    self.collect_tree_matches(owner, child, out);
                }
            }
            DependencySpec::Conditional(condition, children) => {
                if condition_met(self.env, owner.as_ref(), condition) {
                    for child in children {
                        self.collect_tree_matches(owner, child, out);
                    }
                }
            }
            DependencySpec::Package(spec) => {
                // a `:*` requirement wants its best provider only
                let best_only = matches!(
                    spec.slot_requirement(),
                    Some(SlotRequirement::AnyUnlocked)
                );
                let generator = Generator::Matches(
                    spec.clone(),
                    MatchPackageOptions {
                        ignore_additional_requirements: false,
                        from_id: Some(Arc::clone(owner)),
                    },
                )
                .filtered(Filter::InstalledAtRoot);
                let selection = if best_only {
                    Selection::BestVersionOnly(generator)
                } else {
                    Selection::AllVersionsSorted(generator)
                };
                out.extend(selection.execute(self.env).unwrap_or_default());
            }
            DependencySpec::NamedSet(named) => match self.env.set(&named.name) {
                Some(set) => {
                    let tree = set_as_dependencies(&set);
                    self.collect_tree_matches(owner, &tree, out);
                }
                None => tracing::warn!(set = %named.name, "unknown set"),
            },
            DependencySpec::Block(_) | DependencySpec::Labels(_) => {}
        }
    }

    /// Installed packages that depend on `id`, added as removals or
    /// errors.
    fn add_dependents_of(&mut self, id: &dyn PackageID, error: bool) {
        let everything = self.collect_all_installed();
        let mut dependents = Vec::new();
        for candidate in &everything {
            let depped = self.collect_depped_upon(std::slice::from_ref(candidate));
            if depped
                .iter()
                .any(|dep| package_ids_equal(dep.as_ref(), id))
            {
                dependents.push(Arc::clone(candidate));
            }
        }
        for dependent in dependents {
            tracing::debug!(
                dependent = %dependent.canonical_form(CanonicalForm::Full),
                needs = %id.canonical_form(CanonicalForm::Full),
                "adding dependent"
            );
            self.real_add(
                dependent,
                Some(DepTag::Dependency {
                    spec: id.name().to_string(),
                }),
                error,
            );
        }
    }

    /// Add dependencies of listed removals that nothing outside the
    /// list still uses, repeating until a fixed point.
    fn add_unused_dependencies(&mut self) {
        let everything = self.collect_all_installed();
        loop {
            let removal_targets: Vec<Arc<dyn PackageID>> = self
                .list
                .iter()
                .filter(|entry| entry.kind != UninstallListEntryKind::Required)
                .map(|entry| Arc::clone(&entry.id))
                .collect();
            let target_keys: BTreeSet<PackageIDKey> = removal_targets
                .iter()
                .map(|id| PackageIDKey::of(id.as_ref()))
                .collect();

            let depped_by_list = self.collect_depped_upon(&removal_targets);

            let others: Vec<Arc<dyn PackageID>> = everything
                .iter()
                .filter(|id| !target_keys.contains(&PackageIDKey::of(id.as_ref())))
                .cloned()
                .collect();
            let depped_by_others: BTreeSet<PackageIDKey> = self
                .collect_depped_upon(&others)
                .iter()
                .map(|id| PackageIDKey::of(id.as_ref()))
                .collect();

            let world = self.env.set(SetName::new("world").expect("world is valid"));

            let mut added = false;
            for id in depped_by_list {
                if depped_by_others.contains(&PackageIDKey::of(id.as_ref())) {
                    continue;
                }
                if self.position_of(id.as_ref()).is_some() {
                    continue;
                }
                if let Some(world) = &world {
                    if match_package_in_set(
                        self.env,
                        world,
                        id.as_ref(),
                        &MatchPackageOptions::default(),
                    ) {
                        continue;
                    }
                }
                let kind = if id.virtual_for_key().is_some() {
                    UninstallListEntryKind::Virtual
                } else {
                    UninstallListEntryKind::Package
                };
                self.push_entry(id, None, kind);
                added = true;
            }
            if !added {
                break;
            }
        }
    }

    /// Order removals so that dependents appear before the things
    /// they depend on.
    fn order_dependents_first(
        &mut self,
        ids: Vec<Arc<dyn PackageID>>,
    ) -> Vec<Arc<dyn PackageID>> {
        let keys: Vec<PackageIDKey> = ids
            .iter()
            .map(|id| PackageIDKey::of(id.as_ref()))
            .collect();
        // edges[i] holds the in-set packages that ids[i] depends on
        let mut edges: Vec<BTreeSet<usize>> = Vec::with_capacity(ids.len());
        for id in &ids {
            let depped = self.collect_depped_upon(std::slice::from_ref(id));
            let targets = depped
                .iter()
                .filter_map(|dep| {
                    let key = PackageIDKey::of(dep.as_ref());
                    keys.iter().position(|k| *k == key)
                })
                .collect();
            edges.push(targets);
        }

        let mut placed = vec![false; ids.len()];
        let mut order: Vec<usize> = Vec::with_capacity(ids.len());
        while order.len() < ids.len() {
            let mut progressed = false;
            for index in 0..ids.len() {
                if placed[index] {
                    continue;
                }
                // place a package only once everything depending on
                // it is already placed
                let blocked = (0..ids.len()).any(|other| {
                    !placed[other] && other != index && edges[other].contains(&index)
                });
                if !blocked {
                    placed[index] = true;
                    order.push(index);
                    progressed = true;
                }
            }
            if !progressed {
                // dependency cycle: emit the remainder in input order
                for index in 0..ids.len() {
                    if !placed[index] {
                        placed[index] = true;
                        order.push(index);
                    }
                }
            }
        }

        let mut slots: Vec<Option<Arc<dyn PackageID>>> = ids.into_iter().map(Some).collect();
        order
            .into_iter()
            .map(|index| slots[index].take().expect("each index is placed once"))
            .collect()
    }
}

fn set_as_dependencies(set: &murex_depspec::SetSpec) -> DependencySpec {
    match set {
        murex_depspec::SetSpec::All(children) => {
            DependencySpec::All(children.iter().map(set_as_dependencies).collect())
        }
        murex_depspec::SetSpec::Package(spec) => DependencySpec::Package(spec.clone()),
        murex_depspec::SetSpec::NamedSet(named) => DependencySpec::NamedSet(named.clone()),
    }
}
