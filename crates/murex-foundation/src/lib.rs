// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

pub mod name;
pub mod version;

pub use name::{
    CategoryName,
    CategoryNameBuf,
    ChoiceNameWithPrefix,
    ChoiceNameWithPrefixBuf,
    ChoicePrefixName,
    ChoicePrefixNameBuf,
    KeywordName,
    KeywordNameBuf,
    PackageNamePart,
    PackageNamePartBuf,
    QualifiedPackageName,
    RepositoryName,
    RepositoryNameBuf,
    SetName,
    SetNameBuf,
    SlotName,
    SlotNameBuf,
    UnprefixedChoiceName,
    UnprefixedChoiceNameBuf,
};
pub use version::{VersionOperator, VersionSpec};
