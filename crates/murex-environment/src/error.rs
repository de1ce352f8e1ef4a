// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::path::PathBuf;

use miette::Diagnostic;
use murex_foundation::name::QualifiedPackageName;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Diagnostic, Debug, Error)]
pub enum Error {
    #[error("No package matches '{query}'")]
    NoSuchPackage { query: String },
    #[error("No repository named '{name}'")]
    NoSuchRepository { name: String },
    #[error("'{package}' is ambiguous; did you mean one of {alternatives:?}?")]
    AmbiguousPackageName {
        package: String,
        alternatives: Vec<QualifiedPackageName>,
    },
    #[error("No set named '{name}'")]
    NoSuchSet { name: String },
    #[error("Error in set file '{path}': {message}")]
    SetFile { path: PathBuf, message: String },
    #[error("Set '{name}' cannot be modified")]
    SetNotWriteable { name: String },
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
    #[error(transparent)]
    #[diagnostic(forward(0))]
    DepSpecError(#[from] murex_depspec::Error),
    #[error(transparent)]
    #[diagnostic(forward(0))]
    IdError(#[from] murex_id::Error),
}
