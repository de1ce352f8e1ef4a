// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

mod error;
mod merger;

pub use error::{Error, Result};
pub use merger::{
    default_config_protect_name,
    ConfigProtectCallback,
    ConfigProtectNameCallback,
    FSMerger,
    FSMergerOptions,
    FSMergerParams,
    NewIdsCallback,
};
