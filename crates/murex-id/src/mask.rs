// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::path::PathBuf;

use murex_foundation::name::{ChoiceNameWithPrefixBuf, KeywordNameBuf};

/// Where and why a repository masks a package.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RepositoryMaskInfo {
    pub mask_file: PathBuf,
    pub comment: Vec<String>,
}

/// A reason an ID may not be installed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Mask {
    /// Masked by user configuration.
    User { description: String },
    /// Masked by its repository.
    Repository { info: RepositoryMaskInfo },
    /// No keyword accepted by the environment.
    Keyword {
        keywords: Vec<KeywordNameBuf>,
        description: String,
    },
    /// A license the environment does not accept.
    License { licenses: Vec<String> },
    /// A locked choice the environment cannot satisfy.
    ChoiceRequired { choice: ChoiceNameWithPrefixBuf },
    /// An unaccepted metadata key.
    Unaccepted { key_name: String },
    /// Metadata could not be interpreted.
    Broken { reason: String },
}

impl Mask {
    /// The single-character tag shown next to masked packages.
    pub fn key(&self) -> char {
        match self {
            Mask::User { .. } => 'U',
            Mask::Repository { .. } => 'R',
            Mask::Keyword { .. } => 'K',
            Mask::License { .. } => 'L',
            Mask::ChoiceRequired { .. } => 'C',
            Mask::Unaccepted { .. } => 'N',
            Mask::Broken { .. } => 'B',
        }
    }

    pub fn description(&self) -> String {
        match self {
            Mask::User { description } => description.clone(),
            Mask::Repository { info } => format!(
                "masked by {}",
                info.mask_file.display()
            ),
            Mask::Keyword { description, .. } => description.clone(),
            Mask::License { licenses } => {
                format!("unaccepted licences: {}", licenses.join(", "))
            }
            Mask::ChoiceRequired { choice } => {
                format!("requires locked choice {choice}")
            }
            Mask::Unaccepted { key_name } => format!("unaccepted key {key_name}"),
            Mask::Broken { reason } => format!("broken: {reason}"),
        }
    }
}
