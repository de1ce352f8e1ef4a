// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! The murex package-manager core, re-exported as one crate.
//!
//! The pieces fit together as: an [`environment::Environment`]
//! aggregates repositories whose [`id::PackageID`]s expose their
//! metadata as [`depspec`] trees; [`resolve::DepList`] turns targets
//! into an ordered plan; built images reach the filesystem through
//! [`merge::FSMerger`]; and [`ndbam`] records what is installed.

pub use murex_depspec as depspec;
pub use murex_environment as environment;
pub use murex_foundation as foundation;
pub use murex_id as id;
pub use murex_merge as merge;
pub use murex_ndbam as ndbam;
pub use murex_repository as repository;
pub use murex_resolve as resolve;
