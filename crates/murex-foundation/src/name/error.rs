// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Diagnostic, Debug, Error)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(forward(0))]
    InvalidNameError(#[from] super::InvalidNameError),
}

impl Error {
    /// The class of name that failed validation.
    pub fn name_kind(&self) -> super::NameKind {
        match self {
            Error::InvalidNameError(e) => e.kind,
        }
    }
}
