// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Diagnostic, Debug, Error)]
pub enum Error {
    #[error("No usable candidate for '{query}': every version is masked or missing")]
    AllMasked { query: String },
    #[error("Block violated: {message}")]
    Block { message: String },
    #[error("Circular dependency involving {cycle:?}")]
    CircularDependency { cycle: Vec<String> },
    #[error("Additional requirements not met for '{query}'")]
    AdditionalRequirementsNotMet { query: String },
    #[error("Downgrade from {from} to {to} is not allowed")]
    DowngradeNotAllowed { from: String, to: String },
    #[error("No destination repository can take '{query}'")]
    NoDestination { query: String },
    #[error("The uninstall list contains errors and must not be executed")]
    UninstallListHasErrors,
    #[error("No set named '{name}'")]
    NoSuchSet { name: String },
    #[error(transparent)]
    #[diagnostic(forward(0))]
    EnvironmentError(#[from] murex_environment::Error),
    #[error(transparent)]
    #[diagnostic(forward(0))]
    DepSpecError(#[from] murex_depspec::Error),
}
