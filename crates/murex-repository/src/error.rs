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
