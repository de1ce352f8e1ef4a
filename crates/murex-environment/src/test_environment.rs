// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! An environment with programmable policy, for tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use murex_depspec::{PackageDepSpec, SetSpec};
use murex_foundation::name::{
    ChoiceNameWithPrefix,
    KeywordNameBuf,
    QualifiedPackageName,
    RepositoryName,
    SetName,
    SetNameBuf,
};
use murex_id::{Mask, PackageID, PackageIDKey};
use murex_repository::Repository;

use crate::environment::Environment;
use crate::error::Result;
use crate::hooks::{Hook, HookFn, HookResult};

struct TestEnvironmentState {
    repositories: Vec<(u32, Arc<dyn Repository>)>,
    world: BTreeSet<QualifiedPackageName>,
    choice_overrides: HashMap<String, bool>,
    accepted_keywords: BTreeSet<KeywordNameBuf>,
    rejected_licenses: BTreeSet<String>,
    user_masks: HashMap<PackageIDKey, String>,
    user_unmasks: BTreeSet<PackageIDKey>,
    sets: BTreeMap<SetNameBuf, SetSpec>,
    hooks: Vec<HookFn>,
}

/// An [`Environment`] whose policy is set directly by tests.
pub struct TestEnvironment {
    root: PathBuf,
    state: Mutex<TestEnvironmentState>,
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new("/")
    }
}

impl TestEnvironment {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: Mutex::new(TestEnvironmentState {
                repositories: Vec::new(),
                world: BTreeSet::new(),
                choice_overrides: HashMap::new(),
                accepted_keywords: ["test".parse().expect("test is a valid keyword")]
                    .into_iter()
                    .collect(),
                rejected_licenses: BTreeSet::new(),
                user_masks: HashMap::new(),
                user_unmasks: BTreeSet::new(),
                sets: BTreeMap::new(),
                hooks: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TestEnvironmentState> {
        self.state.lock().expect("test environment lock poisoned")
    }

    /// Register a repository; higher importance wins version ties.
    pub fn add_repository(&self, importance: u32, repository: Arc<dyn Repository>) {
        let mut state = self.lock();
        state.repositories.push((importance, repository));
        state.repositories.sort_by(|a, b| b.0.cmp(&a.0));
    }

    /// Force a choice flag on or off for every package.
    pub fn override_choice(&self, name: &str, enabled: bool) {
        self.lock().choice_overrides.insert(name.to_owned(), enabled);
    }

    pub fn accept_keyword(&self, keyword: &str) {
        self.lock()
            .accepted_keywords
            .insert(keyword.parse().expect("invalid keyword in test setup"));
    }

    pub fn reject_license(&self, license: &str) {
        self.lock().rejected_licenses.insert(license.to_owned());
    }

    pub fn add_user_mask(&self, id: &dyn PackageID, reason: &str) {
        self.lock()
            .user_masks
            .insert(PackageIDKey::of(id), reason.to_owned());
    }

    pub fn add_user_unmask(&self, id: &dyn PackageID) {
        self.lock().user_unmasks.insert(PackageIDKey::of(id));
    }

    pub fn add_set(&self, name: &str, set: SetSpec) {
        self.lock()
            .sets
            .insert(name.parse().expect("invalid set name in test setup"), set);
    }

    pub fn add_hook(&self, hook: HookFn) {
        self.lock().hooks.push(hook);
    }

    pub fn world(&self) -> BTreeSet<QualifiedPackageName> {
        self.lock().world.clone()
    }
}

impl Environment for TestEnvironment {
    fn repositories(&self) -> Vec<Arc<dyn Repository>> {
        self.lock()
            .repositories
            .iter()
            .map(|(_, r)| Arc::clone(r))
            .collect()
    }

    fn repository_importance(&self, name: &RepositoryName) -> u32 {
        self.lock()
            .repositories
            .iter()
            .find(|(_, r)| *r.name() == *name)
            .map(|(importance, _)| *importance)
            .unwrap_or(0)
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn want_choice_enabled(
        &self,
        _id: &dyn PackageID,
        choice: &ChoiceNameWithPrefix,
    ) -> Option<bool> {
        self.lock().choice_overrides.get(choice.as_str()).copied()
    }

    fn accept_keywords(&self, keywords: &BTreeSet<KeywordNameBuf>, _id: &dyn PackageID) -> bool {
        let state = self.lock();
        if state.accepted_keywords.iter().any(|k| *k == "*") {
            return !keywords.is_empty();
        }
        keywords
            .iter()
            .any(|k| state.accepted_keywords.contains(k))
    }

    fn accept_license(&self, license: &str, _id: &dyn PackageID) -> bool {
        !self.lock().rejected_licenses.contains(license)
    }

    fn mask_for_user(&self, id: &dyn PackageID) -> Option<Mask> {
        self.lock()
            .user_masks
            .get(&PackageIDKey::of(id))
            .map(|reason| Mask::User {
                description: reason.clone(),
            })
    }

    fn unmasked_by_user(&self, id: &dyn PackageID) -> bool {
        self.lock().user_unmasks.contains(&PackageIDKey::of(id))
    }

    fn set(&self, name: &SetName) -> Option<SetSpec> {
        let base = name.base_name();
        if *base == *SetName::new("world").expect("world is a valid set name") {
            let state = self.lock();
            let children = state
                .world
                .iter()
                .map(|name| {
                    SetSpec::Package(
                        PackageDepSpec::builder()
                            .package(name.clone())
                            .build()
                            .expect("name is always set"),
                    )
                })
                .collect();
            return Some(SetSpec::All(children));
        }

        if let Some(found) = self.lock().sets.get(base).cloned() {
            return Some(found);
        }
        for repository in self.repositories() {
            if let Some(found) = repository.sets().get(base).cloned() {
                return Some(found);
            }
        }
        None
    }

    fn add_to_world(&self, name: &QualifiedPackageName) -> Result<bool> {
        Ok(self.lock().world.insert(name.clone()))
    }

    fn remove_from_world(&self, name: &QualifiedPackageName) -> Result<bool> {
        Ok(self.lock().world.remove(name))
    }

    fn perform_hook(&self, hook: &Hook) -> HookResult {
        let state = self.lock();
        let mut result = HookResult::default();
        for hook_fn in &state.hooks {
            result.merge(hook_fn(hook));
        }
        result
    }
}
