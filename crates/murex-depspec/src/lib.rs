// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

mod error;
mod options;
mod package_dep_spec;
pub mod parse;
mod parsing;
mod spec_tree;

pub use error::{Error, PackageDepSpecError, Result, SpecTreeParseError};
pub use options::ParseOptions;
pub use package_dep_spec::{
    ChoiceRequirement,
    ChoiceRequirementKind,
    DepSpecAnnotations,
    InstallableToPath,
    InstallableToRepository,
    KeyRequirement,
    NameConstraint,
    PackageDepSpec,
    PackageDepSpecBuilder,
    SlotRequirement,
    VersionRequirement,
    VersionRequirementsMode,
};
pub use parse::{
    parse_dependency_spec,
    parse_fetchable_uri_spec,
    parse_license_spec,
    parse_plain_text_spec,
    parse_provide_spec,
    parse_set_spec,
    parse_simple_uri_spec,
};
pub use spec_tree::{
    BlockDepSpec,
    ConditionalDepSpec,
    DependencyLabel,
    DependencyLabelsDepSpec,
    DependencySpec,
    FetchableUriDepSpec,
    FetchableUriSpec,
    LicenseDepSpec,
    LicenseSpec,
    NamedSetDepSpec,
    PlainTextDepSpec,
    PlainTextSpec,
    ProvideSpec,
    SetSpec,
    SimpleUriDepSpec,
    SimpleUriSpec,
    UriLabelsDepSpec,
};
