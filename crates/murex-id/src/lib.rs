// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

mod action;
mod choices;
mod contents;
mod error;
mod mask;
mod metadata_key;
mod package_id;

pub use action::{
    Action,
    ActionKind,
    ConfigAction,
    DiscardOutput,
    FetchAction,
    FetchActionFailure,
    FetchActionOptions,
    InfoAction,
    InstallAction,
    OutputManager,
    PretendAction,
    PretendFetchAction,
    UninstallAction,
    WantPhase,
};
pub use choices::{
    standard_build_options,
    Choice,
    ChoiceOrigin,
    ChoiceValue,
    Choices,
    PermittedChoiceValueParameterValues,
};
pub use contents::ContentsEntry;
pub use error::{Error, Result};
pub use mask::{Mask, RepositoryMaskInfo};
pub use metadata_key::{
    MetadataKey,
    MetadataKeyType,
    MetadataKeyVisitor,
    MetadataValue,
    PackageRef,
};
pub use package_id::{
    key_names,
    package_ids_equal,
    CanonicalForm,
    PackageID,
    PackageIDComparator,
    PackageIDKey,
};
