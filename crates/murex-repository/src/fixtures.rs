// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! Programmable in-memory repositories for tests.
//!
//! A fake ID is created with just a name and version; everything
//! else is defaulted and can be replaced afterwards:
//!
//! ```
//! # use murex_repository::fixtures::FakeRepository;
//! let repo = FakeRepository::new("fake");
//! let id = repo.add_version("cat", "pkg", "1.0");
//! id.set_slot("2");
//! id.set_run_dependencies("cat/other");
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use murex_depspec::{parse_dependency_spec, parse_provide_spec, DependencySpec, ParseOptions, ProvideSpec, SetSpec};
use murex_foundation::name::{
    CategoryName,
    CategoryNameBuf,
    ChoiceNameWithPrefix,
    ChoicePrefixName,
    KeywordNameBuf,
    QualifiedPackageName,
    RepositoryName,
    RepositoryNameBuf,
    SetNameBuf,
    SlotNameBuf,
};
use murex_foundation::version::VersionSpec;
use murex_id::{
    key_names,
    Action,
    ActionKind,
    Choice,
    ChoiceValue,
    Choices,
    ContentsEntry,
    Mask,
    MetadataKey,
    MetadataKeyType,
    MetadataValue,
    PackageID,
    PackageRef,
    WantPhase,
};

use crate::repository::{Repository, RepositoryCapabilities};

#[cfg(test)]
#[path = "./fixtures_test.rs"]
mod fixtures_test;

#[derive(Debug)]
struct FakeIdState {
    slot: SlotNameBuf,
    keywords: BTreeSet<KeywordNameBuf>,
    choices: Arc<Choices>,
    build_dependencies: Option<DependencySpec>,
    run_dependencies: Option<DependencySpec>,
    post_dependencies: Option<DependencySpec>,
    suggested_dependencies: Option<DependencySpec>,
    provide: Option<ProvideSpec>,
    virtual_for: Option<PackageRef>,
    masks: Vec<Mask>,
    contents: Option<Vec<ContentsEntry>>,
    installed_time: Option<SystemTime>,
    fs_location: Option<PathBuf>,
    supported_actions: BTreeSet<ActionKind>,
}

/// A package ID whose metadata is assembled by the test.
#[derive(Debug)]
pub struct FakePackageID {
    name: QualifiedPackageName,
    version: VersionSpec,
    repository: RepositoryNameBuf,
    state: Mutex<FakeIdState>,
    performed: Mutex<Vec<ActionKind>>,
}

impl FakePackageID {
    fn new(
        name: QualifiedPackageName,
        version: VersionSpec,
        repository: RepositoryNameBuf,
        installed: bool,
    ) -> Self {
        let supported: &[ActionKind] = if installed {
            &[ActionKind::Uninstall, ActionKind::Config, ActionKind::Info]
        } else {
            &[
                ActionKind::Fetch,
                ActionKind::PretendFetch,
                ActionKind::Pretend,
                ActionKind::Install,
                ActionKind::Info,
            ]
        };
        Self {
            name,
            version,
            repository,
            state: Mutex::new(FakeIdState {
                slot: "0".parse().expect("0 is a valid slot"),
                keywords: ["test".parse().expect("test is a valid keyword")]
                    .into_iter()
                    .collect(),
                choices: Arc::new(Choices::new()),
                build_dependencies: None,
                run_dependencies: None,
                post_dependencies: None,
                suggested_dependencies: None,
                provide: None,
                virtual_for: None,
                masks: Vec::new(),
                contents: None,
                installed_time: None,
                fs_location: None,
                supported_actions: supported.iter().copied().collect(),
            }),
            performed: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeIdState> {
        self.state.lock().expect("fake id state lock poisoned")
    }

    pub fn set_slot(&self, slot: &str) {
        self.lock().slot = slot.parse().expect("invalid slot in test setup");
    }

    /// Replace the keyword set from a space-separated string.
    pub fn set_keywords(&self, keywords: &str) {
        self.lock().keywords = keywords
            .split_whitespace()
            .map(|k| k.parse().expect("invalid keyword in test setup"))
            .collect();
    }

    /// Replace the plain USE-style choices; a leading `-` disables.
    pub fn set_choices(&self, values: &[&str]) {
        let prefix = ChoicePrefixName::unprefixed();
        let mut choice = Choice::new("USE", "USE", prefix.to_owned());
        for value in values {
            let (name, enabled) = match value.strip_prefix('-') {
                Some(name) => (name, false),
                None => (*value, true),
            };
            choice.add(ChoiceValue::simple(
                prefix,
                name.parse().expect("invalid choice in test setup"),
                enabled,
            ));
        }
        let mut choices = Choices::new();
        choices.add(Arc::new(choice));
        self.lock().choices = Arc::new(choices);
    }

    pub fn set_build_dependencies(&self, text: &str) {
        self.lock().build_dependencies =
            Some(parse_dependency_spec(text, &ParseOptions::metadata()).expect("invalid deps"));
    }

    pub fn set_run_dependencies(&self, text: &str) {
        self.lock().run_dependencies =
            Some(parse_dependency_spec(text, &ParseOptions::metadata()).expect("invalid deps"));
    }

    pub fn set_post_dependencies(&self, text: &str) {
        self.lock().post_dependencies =
            Some(parse_dependency_spec(text, &ParseOptions::metadata()).expect("invalid deps"));
    }

    pub fn set_suggested_dependencies(&self, text: &str) {
        self.lock().suggested_dependencies =
            Some(parse_dependency_spec(text, &ParseOptions::metadata()).expect("invalid deps"));
    }

    pub fn set_provide(&self, text: &str) {
        self.lock().provide =
            Some(parse_provide_spec(text, &ParseOptions::metadata()).expect("invalid provide"));
    }

    pub fn set_virtual_for(&self, name: &str, version: &str) {
        self.lock().virtual_for = Some(PackageRef {
            name: name.parse().expect("invalid name in test setup"),
            version: version.parse().expect("invalid version in test setup"),
        });
    }

    pub fn add_mask(&self, mask: Mask) {
        self.lock().masks.push(mask);
    }

    pub fn set_contents(&self, contents: Vec<ContentsEntry>) {
        self.lock().contents = Some(contents);
    }

    pub fn set_installed_time(&self, time: SystemTime) {
        self.lock().installed_time = Some(time);
    }

    pub fn set_fs_location(&self, location: PathBuf) {
        self.lock().fs_location = Some(location);
    }

    pub fn set_supports_action(&self, kind: ActionKind, supported: bool) {
        let mut state = self.lock();
        if supported {
            state.supported_actions.insert(kind);
        } else {
            state.supported_actions.remove(&kind);
        }
    }

    /// The actions performed on this ID, in order.
    pub fn performed_actions(&self) -> Vec<ActionKind> {
        self.performed
            .lock()
            .expect("performed actions lock poisoned")
            .clone()
    }

    /// True if the named choice value is enabled on this ID.
    pub fn choice_enabled(&self, name: &ChoiceNameWithPrefix) -> bool {
        self.lock()
            .choices
            .find_by_name_with_prefix(name)
            .map(|v| v.enabled)
            .unwrap_or(false)
    }
}

impl PackageID for FakePackageID {
    fn name(&self) -> &QualifiedPackageName {
        &self.name
    }

    fn version(&self) -> &VersionSpec {
        &self.version
    }

    fn repository_name(&self) -> &RepositoryName {
        self.repository.as_ref()
    }

    fn slot(&self) -> Option<SlotNameBuf> {
        Some(self.lock().slot.clone())
    }

    fn metadata_keys(&self) -> Vec<Arc<MetadataKey>> {
        let state = self.lock();
        let mut keys = vec![
            Arc::new(MetadataKey::new(
                key_names::SLOT,
                "Slot",
                MetadataKeyType::Normal,
                MetadataValue::Str(state.slot.to_string()),
            )),
            Arc::new(MetadataKey::new(
                key_names::KEYWORDS,
                "Keywords",
                MetadataKeyType::Significant,
                MetadataValue::Keywords(state.keywords.clone()),
            )),
            Arc::new(MetadataKey::new(
                key_names::CHOICES,
                "Choices",
                MetadataKeyType::Internal,
                MetadataValue::Choices(Arc::clone(&state.choices)),
            )),
        ];
        let dependency_keys = [
            (key_names::BUILD_DEPENDENCIES, "Build dependencies", &state.build_dependencies),
            (key_names::RUN_DEPENDENCIES, "Run dependencies", &state.run_dependencies),
            (key_names::POST_DEPENDENCIES, "Post dependencies", &state.post_dependencies),
            (
                key_names::SUGGESTED_DEPENDENCIES,
                "Suggested dependencies",
                &state.suggested_dependencies,
            ),
        ];
        for (raw, human, tree) in dependency_keys {
            if let Some(tree) = tree {
                keys.push(Arc::new(MetadataKey::new(
                    raw,
                    human,
                    MetadataKeyType::Dependencies,
                    MetadataValue::Dependencies(tree.clone()),
                )));
            }
        }
        if let Some(provide) = &state.provide {
            keys.push(Arc::new(MetadataKey::new(
                key_names::PROVIDE,
                "Provides",
                MetadataKeyType::Dependencies,
                MetadataValue::Provides(provide.clone()),
            )));
        }
        if let Some(virtual_for) = &state.virtual_for {
            keys.push(Arc::new(MetadataKey::new(
                key_names::VIRTUAL_FOR,
                "Virtual for",
                MetadataKeyType::Normal,
                MetadataValue::PackageRef(virtual_for.clone()),
            )));
        }
        if let Some(contents) = &state.contents {
            keys.push(Arc::new(MetadataKey::new(
                key_names::CONTENTS,
                "Contents",
                MetadataKeyType::Internal,
                MetadataValue::Contents(contents.clone()),
            )));
        }
        if let Some(time) = state.installed_time {
            keys.push(Arc::new(MetadataKey::new(
                key_names::INSTALLED_TIME,
                "Installed time",
                MetadataKeyType::Normal,
                MetadataValue::Time(time),
            )));
        }
        if let Some(location) = &state.fs_location {
            keys.push(Arc::new(MetadataKey::new(
                key_names::FS_LOCATION,
                "Location",
                MetadataKeyType::Internal,
                MetadataValue::Path(location.clone()),
            )));
        }
        keys
    }

    fn masks(&self) -> Vec<Mask> {
        self.lock().masks.clone()
    }

    fn supports_action(&self, kind: ActionKind) -> bool {
        self.lock().supported_actions.contains(&kind)
    }

    fn perform_action(&self, action: &mut Action<'_>) -> murex_id::Result<()> {
        let kind = action.kind();
        if !self.supports_action(kind) {
            return Err(murex_id::Error::UnsupportedAction {
                id: self.canonical_form(murex_id::CanonicalForm::Full),
                action: kind,
            });
        }
        if let Action::Install(install) = action {
            for phase in ["setup", "build", "install"] {
                match (install.want_phase)(phase) {
                    WantPhase::Continue => {}
                    WantPhase::Skip => continue,
                    WantPhase::Abort => {
                        return Err(murex_id::Error::ActionAborted {
                            id: self.canonical_form(murex_id::CanonicalForm::Full),
                            action: kind,
                            phase: phase.to_string(),
                        })
                    }
                }
            }
            let replacing = std::mem::take(&mut install.replacing);
            for replaced in &replacing {
                (install.perform_uninstall)(replaced.as_ref())?;
            }
            install.replacing = replacing;
        }
        self.performed
            .lock()
            .expect("performed actions lock poisoned")
            .push(kind);
        Ok(())
    }
}

struct FakeRepositoryState {
    packages: BTreeMap<QualifiedPackageName, Vec<Arc<FakePackageID>>>,
    sets: BTreeMap<SetNameBuf, SetSpec>,
}

/// An in-memory repository whose contents tests assemble by hand.
pub struct FakeRepository {
    name: RepositoryNameBuf,
    installed_root: Option<PathBuf>,
    state: Mutex<FakeRepositoryState>,
}

impl FakeRepository {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.parse().expect("invalid repository name in test setup"),
            installed_root: None,
            state: Mutex::new(FakeRepositoryState {
                packages: BTreeMap::new(),
                sets: BTreeMap::new(),
            }),
        })
    }

    /// A repository representing installed packages under `root`.
    pub fn new_installed(name: &str, root: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            name: name.parse().expect("invalid repository name in test setup"),
            installed_root: Some(root.into()),
            state: Mutex::new(FakeRepositoryState {
                packages: BTreeMap::new(),
                sets: BTreeMap::new(),
            }),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeRepositoryState> {
        self.state.lock().expect("fake repository lock poisoned")
    }

    pub fn is_installed_repository(&self) -> bool {
        self.installed_root.is_some()
    }

    /// Add one version of a package and return it for further setup.
    pub fn add_version(&self, category: &str, package: &str, version: &str) -> Arc<FakePackageID> {
        let name: QualifiedPackageName = format!("{category}/{package}")
            .parse()
            .expect("invalid package name in test setup");
        let version: VersionSpec = version.parse().expect("invalid version in test setup");
        let id = Arc::new(FakePackageID::new(
            name.clone(),
            version,
            self.name.clone(),
            self.installed_root.is_some(),
        ));
        let mut state = self.lock();
        let ids = state.packages.entry(name).or_default();
        ids.push(Arc::clone(&id));
        ids.sort_by(|a, b| a.version().cmp(b.version()));
        id
    }

    pub fn add_package_set(&self, name: &str, set: SetSpec) {
        self.lock()
            .sets
            .insert(name.parse().expect("invalid set name in test setup"), set);
    }
}

impl Repository for FakeRepository {
    fn name(&self) -> &RepositoryName {
        self.name.as_ref()
    }

    fn capabilities(&self) -> RepositoryCapabilities {
        RepositoryCapabilities {
            destination: self.installed_root.is_some(),
            ..RepositoryCapabilities::default()
        }
    }

    fn category_names(&self) -> BTreeSet<CategoryNameBuf> {
        self.lock()
            .packages
            .keys()
            .map(|q| q.category.clone())
            .collect()
    }

    fn package_names(&self, category: &CategoryName) -> BTreeSet<QualifiedPackageName> {
        self.lock()
            .packages
            .keys()
            .filter(|q| *q.category == *category)
            .cloned()
            .collect()
    }

    fn package_ids(&self, name: &QualifiedPackageName) -> Vec<Arc<dyn PackageID>> {
        self.lock()
            .packages
            .get(name)
            .map(|ids| {
                ids.iter()
                    .map(|id| Arc::clone(id) as Arc<dyn PackageID>)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn some_ids_might_support_action(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Uninstall | ActionKind::Config => self.installed_root.is_some(),
            ActionKind::Install | ActionKind::Fetch | ActionKind::PretendFetch
            | ActionKind::Pretend => self.installed_root.is_none(),
            ActionKind::Info => true,
        }
    }

    fn is_suitable_destination_for(&self, _id: &dyn PackageID) -> bool {
        self.installed_root.is_some()
    }

    fn installed_root_key(&self) -> Option<Arc<MetadataKey>> {
        self.installed_root.as_ref().map(|root| {
            Arc::new(MetadataKey::new(
                "root",
                "Root",
                MetadataKeyType::Internal,
                MetadataValue::Path(root.clone()),
            ))
        })
    }

    fn format_key(&self) -> Option<Arc<MetadataKey>> {
        Some(Arc::new(MetadataKey::new(
            "format",
            "Format",
            MetadataKeyType::Significant,
            MetadataValue::Str("fake".to_string()),
        )))
    }

    fn sets(&self) -> BTreeMap<SetNameBuf, SetSpec> {
        self.lock().sets.clone()
    }
}
