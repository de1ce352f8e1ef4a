// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

mod error;
pub mod fixtures;
mod repository;

pub use error::{Error, Result};
pub use repository::{Repository, RepositoryCapabilities};
