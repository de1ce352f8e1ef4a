// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Diagnostic, Debug, Error)]
pub enum Error {
    #[error("Merge check found {} problem(s): {}", failures.len(), failures.join("; "))]
    CheckFailed { failures: Vec<String> },
    #[error("Error merging '{path}': {message}")]
    Merge { path: PathBuf, message: String },
    #[error("Hook '{hook}' aborted the merge with status {status}")]
    HookAborted { hook: String, status: i32 },
    #[error("Could not {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    pub fn merge(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Merge {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
