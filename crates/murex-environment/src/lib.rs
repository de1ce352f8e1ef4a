// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

mod environment;
mod error;
mod hooks;
mod match_package;
mod selection;
mod set_file;
pub mod test_environment;

pub use environment::{
    fetch_unique_qualified_package_name,
    is_installed_at_root,
    package_id_comparator,
    Environment,
};
pub use error::{Error, Result};
pub use hooks::{Hook, HookFn, HookResult};
pub use match_package::{
    choice_enabled,
    condition_met,
    match_package,
    match_package_in_set,
    MatchPackageOptions,
};
pub use selection::{Filter, FilteredGenerator, Generator, Selection};
pub use set_file::{
    base_set_name_and_mode,
    SetFile,
    SetFileParams,
    SetFileSetOperatorMode,
    SetFileType,
};
pub use test_environment::TestEnvironment;
