// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Denotes a malformed package dependency specification.
#[derive(Diagnostic, Debug, Error)]
#[error("Error parsing package dep spec '{text}': {message}")]
pub struct PackageDepSpecError {
    pub text: String,
    pub message: String,
}

impl PackageDepSpecError {
    pub fn new_error(text: impl Into<String>, message: impl Into<String>) -> Error {
        Error::PackageDepSpecError(Self {
            text: text.into(),
            message: message.into(),
        })
    }
}

/// Denotes a malformed dependency tree string.
///
/// Carries the offending token and its position in the token stream.
#[derive(Diagnostic, Debug, Error)]
#[error("Error parsing spec tree at token {position} ('{token}'): {message}")]
pub struct SpecTreeParseError {
    pub token: String,
    pub position: usize,
    pub message: String,
}

impl SpecTreeParseError {
    pub fn new_error(
        token: impl Into<String>,
        position: usize,
        message: impl Into<String>,
    ) -> Error {
        Error::SpecTreeParseError(Self {
            token: token.into(),
            position,
            message: message.into(),
        })
    }
}

#[derive(Diagnostic, Debug, Error)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(forward(0))]
    PackageDepSpecError(#[from] PackageDepSpecError),
    #[error(transparent)]
    #[diagnostic(forward(0))]
    SpecTreeParseError(#[from] SpecTreeParseError),
    #[error(transparent)]
    #[diagnostic(forward(0))]
    NameError(#[from] murex_foundation::name::Error),
    #[error(transparent)]
    #[diagnostic(forward(0))]
    VersionError(#[from] murex_foundation::version::Error),
    #[error("Incomplete package dep spec: {0}")]
    IncompleteSpec(String),
}
