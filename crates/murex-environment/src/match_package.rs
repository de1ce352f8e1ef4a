// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::sync::Arc;

use murex_depspec::{
    ChoiceRequirement,
    ChoiceRequirementKind,
    ConditionalDepSpec,
    PackageDepSpec,
    SetSpec,
    SlotRequirement,
};
use murex_foundation::name::ChoiceNameWithPrefix;
use murex_id::{MetadataValue, PackageID};

use crate::environment::Environment;

#[cfg(test)]
#[path = "./match_package_test.rs"]
mod match_package_test;

/// Switches for [`match_package`].
#[derive(Default, Clone)]
pub struct MatchPackageOptions {
    /// Ignore `[use]` and `[.key=value]` requirements.
    pub ignore_additional_requirements: bool,
    /// The package whose dependency string contained the spec, for
    /// `[foo=]` and `[foo?]` forms.
    pub from_id: Option<Arc<dyn PackageID>>,
}

/// The effective enabled state of a choice on an ID: the user's
/// override wins, then the ID's own choices.
pub fn choice_enabled(
    env: &dyn Environment,
    id: &dyn PackageID,
    name: &ChoiceNameWithPrefix,
) -> Option<bool> {
    if let Some(forced) = env.want_choice_enabled(id, name) {
        return Some(forced);
    }
    let choices_key = id.choices_key()?;
    let choices = choices_key.as_choices()?;
    choices.find_by_name_with_prefix(name).map(|v| v.enabled)
}

/// Evaluate a `flag?` condition against the ID that owns the block.
pub fn condition_met(
    env: &dyn Environment,
    id: &dyn PackageID,
    condition: &ConditionalDepSpec,
) -> bool {
    let enabled = choice_enabled(env, id, &condition.flag).unwrap_or(false);
    if condition.inverse {
        !enabled
    } else {
        enabled
    }
}

fn choice_requirement_met(
    env: &dyn Environment,
    id: &dyn PackageID,
    requirement: &ChoiceRequirement,
    options: &MatchPackageOptions,
) -> bool {
    let target_state =
        choice_enabled(env, id, &requirement.name).or(requirement.default_value);
    let Some(target_state) = target_state else {
        // the target doesn't know the flag and no default was given
        return false;
    };
    match requirement.kind {
        ChoiceRequirementKind::Enabled => target_state,
        ChoiceRequirementKind::Disabled => !target_state,
        ChoiceRequirementKind::EqualTo
        | ChoiceRequirementKind::IfEnabled
        | ChoiceRequirementKind::IfDisabled => {
            let Some(from_id) = &options.from_id else {
                tracing::warn!(
                    requirement = %requirement,
                    "conditional use requirement matched without an owning package"
                );
                return true;
            };
            let owner_state =
                choice_enabled(env, from_id.as_ref(), &requirement.name).unwrap_or(false);
            match requirement.kind {
                ChoiceRequirementKind::EqualTo => target_state == owner_state,
                ChoiceRequirementKind::IfEnabled => !owner_state || target_state,
                ChoiceRequirementKind::IfDisabled => owner_state || !target_state,
                _ => unreachable!("outer match covers the other kinds"),
            }
        }
    }
}

fn key_requirement_met(id: &dyn PackageID, key: &str, expected: &str) -> bool {
    let Some(found) = id.find_metadata(key) else {
        return false;
    };
    let rendered = match found.value() {
        MetadataValue::Str(v) => v.clone(),
        MetadataValue::Long(v) => v.to_string(),
        MetadataValue::Bool(v) => v.to_string(),
        MetadataValue::Path(v) => v.display().to_string(),
        _ => return false,
    };
    rendered == expected
}

/// Whether `id` satisfies every component of `spec`.
pub fn match_package(
    env: &dyn Environment,
    spec: &PackageDepSpec,
    id: &dyn PackageID,
    options: &MatchPackageOptions,
) -> bool {
    if !spec.name_constraint().matches(id.name()) {
        return false;
    }

    if !spec.version_requirements_satisfied_by(id.version()) {
        return false;
    }

    if let Some(slot_requirement) = spec.slot_requirement() {
        match slot_requirement {
            SlotRequirement::Exact { name, .. } => {
                // sub-slot and lockedness direct rebuilds, not matching
                match id.slot() {
                    Some(slot) => {
                        if slot != *name {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
            SlotRequirement::AnyLocked | SlotRequirement::AnyUnlocked => {}
        }
    }

    if let Some(repo) = spec.in_repository() {
        if *id.repository_name() != **repo {
            return false;
        }
    }

    if let Some(from_repo) = spec.from_repository() {
        let origin = id
            .find_metadata("REPOSITORY")
            .and_then(|key| key.as_str().map(str::to_owned));
        if origin.as_deref() != Some(from_repo.as_str()) {
            return false;
        }
    }

    if let Some(path) = spec.installed_at_path() {
        let installed_here = env
            .repository(id.repository_name())
            .and_then(|r| r.installed_root_key())
            .and_then(|key| key.as_path().map(|p| p.to_owned()))
            .is_some_and(|root| root == *path);
        if !installed_here {
            return false;
        }
    }

    if let Some(to) = spec.installable_to_repository() {
        let Some(repository) = env.repository(&to.repository) else {
            return false;
        };
        if !repository.is_suitable_destination_for(id) {
            return false;
        }
        if !to.include_masked && id.is_masked() {
            return false;
        }
    }

    if let Some(to) = spec.installable_to_path() {
        let suitable = env.repositories().into_iter().any(|r| {
            r.installed_root_key()
                .and_then(|key| key.as_path().map(|p| p.to_owned()))
                .is_some_and(|root| root == to.path)
                && r.is_suitable_destination_for(id)
        });
        if !suitable {
            return false;
        }
    }

    if !options.ignore_additional_requirements {
        for requirement in spec.choice_requirements() {
            if !choice_requirement_met(env, id, requirement, options) {
                return false;
            }
        }
        for requirement in spec.key_requirements() {
            if !key_requirement_met(id, &requirement.key, &requirement.value) {
                return false;
            }
        }
    }

    true
}

/// Whether any leaf of a set matches the ID.
pub fn match_package_in_set(
    env: &dyn Environment,
    set: &SetSpec,
    id: &dyn PackageID,
    options: &MatchPackageOptions,
) -> bool {
    let mut expanding = Vec::new();
    match_package_in_set_inner(env, set, id, options, &mut expanding)
}

fn match_package_in_set_inner(
    env: &dyn Environment,
    set: &SetSpec,
    id: &dyn PackageID,
    options: &MatchPackageOptions,
    expanding: &mut Vec<murex_foundation::name::SetNameBuf>,
) -> bool {
    match set {
        SetSpec::All(children) => children
            .iter()
            .any(|child| match_package_in_set_inner(env, child, id, options, expanding)),
        SetSpec::Package(spec) => match_package(env, spec, id, options),
        SetSpec::NamedSet(named) => {
            if expanding.contains(&named.name) {
                tracing::warn!(set = %named.name, "recursively defined set");
                return false;
            }
            match env.set(&named.name) {
                Some(inner) => {
                    expanding.push(named.name.clone());
                    let matched =
                        match_package_in_set_inner(env, &inner, id, options, expanding);
                    expanding.pop();
                    matched
                }
                None => {
                    tracing::warn!(set = %named.name, "unknown set");
                    false
                }
            }
        }
    }
}
