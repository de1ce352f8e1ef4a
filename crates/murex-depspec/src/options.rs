// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

/// The per-EAPI dialect switches honoured by the dep spec parsers.
///
/// Every switch defaults to on; repositories narrow the set down to
/// what their metadata format permits.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseOptions {
    /// Permit `|| ( ... )` groups.
    pub allow_any_groups: bool,
    /// Permit `build:`-style dependency labels.
    pub allow_labels: bool,
    /// Permit `src -> rename` in fetchable URI trees.
    pub allow_fetch_renames: bool,
    /// Permit `:slot` dependencies.
    pub allow_slot_deps: bool,
    /// Permit `:=` and `:slot=` forms.
    pub allow_slot_equal_deps: bool,
    /// Permit `:*`.
    pub allow_slot_star_deps: bool,
    /// Permit `::repo` qualifiers.
    pub allow_repository_deps: bool,
    /// Permit `[use]` requirements.
    pub allow_use_deps: bool,
    /// Permit `(+)`/`(-)` defaults on use requirements.
    pub allow_use_dep_defaults: bool,
    /// Permit `[>=1.0&<2.0]` bracketed version requirements.
    pub allow_ranged_deps: bool,
    /// Permit `~cat/pkg-1.0` equal-ignoring-revision requirements.
    pub allow_tilde: bool,
    /// Permit `[[ ... ]]` annotations after a node.
    pub allow_annotations: bool,
    /// Permit `[.key=value]` metadata key requirements.
    pub allow_key_requirements: bool,
    /// Permit `*` in category and package positions.
    pub allow_wildcards: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::permissive()
    }
}

impl ParseOptions {
    /// Every dialect feature enabled.
    pub fn permissive() -> Self {
        Self {
            allow_any_groups: true,
            allow_labels: true,
            allow_fetch_renames: true,
            allow_slot_deps: true,
            allow_slot_equal_deps: true,
            allow_slot_star_deps: true,
            allow_repository_deps: true,
            allow_use_deps: true,
            allow_use_dep_defaults: true,
            allow_ranged_deps: true,
            allow_tilde: true,
            allow_annotations: true,
            allow_key_requirements: true,
            allow_wildcards: true,
        }
    }

    /// The dialect accepted inside repository metadata: no wildcards,
    /// no repository qualifiers, no key requirements.
    pub fn metadata() -> Self {
        Self {
            allow_repository_deps: false,
            allow_key_requirements: false,
            allow_wildcards: false,
            ..Self::permissive()
        }
    }
}
