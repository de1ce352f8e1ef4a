// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use miette::Diagnostic;
use thiserror::Error;

use crate::action::{ActionKind, FetchActionFailure};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Diagnostic, Debug, Error)]
pub enum Error {
    #[error("'{id}' does not support the {action} action")]
    UnsupportedAction { id: String, action: ActionKind },
    #[error("{action} action failed for '{id}': {message}")]
    ActionFailed {
        id: String,
        action: ActionKind,
        message: String,
    },
    #[error("fetch action failed for '{id}'")]
    FetchActionFailed {
        id: String,
        failures: Vec<FetchActionFailure>,
    },
    #[error("{action} action aborted for '{id}' during phase '{phase}'")]
    ActionAborted {
        id: String,
        action: ActionKind,
        phase: String,
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
}
