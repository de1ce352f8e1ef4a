// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Diagnostic, Debug, Error)]
pub enum Error {
    #[error("Bad NDBAM layout at '{path}': {message}")]
    Configuration { path: PathBuf, message: String },
    #[error("NDBAM invariant broken: {message}")]
    Internal { message: String },
    #[error("Could not read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    #[diagnostic(forward(0))]
    NameError(#[from] murex_foundation::name::Error),
    #[error(transparent)]
    #[diagnostic(forward(0))]
    VersionError(#[from] murex_foundation::version::Error),
}

impl Error {
    pub fn configuration(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Configuration {
            path: path.into(),
            message: message.into(),
        }
    }
}
