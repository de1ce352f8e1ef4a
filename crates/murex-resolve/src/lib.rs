// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

mod dep_list;
mod dep_tag;
mod error;
mod uninstall_list;

pub use dep_list::{
    Decision,
    DepList,
    DepListEntry,
    DepListOptions,
    DowngradePolicy,
    ReinstallPolicy,
    Resolvent,
    ORDERING_ANNOTATION,
    ORDERING_DISCARD,
};
pub use dep_tag::DepTag;
pub use error::{Error, Result};
pub use uninstall_list::{
    UninstallList,
    UninstallListEntry,
    UninstallListEntryKind,
    UninstallListOptions,
};
