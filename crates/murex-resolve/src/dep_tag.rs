// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use murex_foundation::name::SetNameBuf;

/// Why an entry is on a plan: asked for directly, pulled in by a
/// dependency, or named by a set.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum DepTag {
    Target,
    Dependency {
        /// The dependency spec that pulled the entry in, in text
        /// form.
        spec: String,
    },
    GeneralSet {
        set: SetNameBuf,
    },
}

impl std::fmt::Display for DepTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepTag::Target => f.write_str("target"),
            DepTag::Dependency { spec } => write!(f, "dependency ({spec})"),
            DepTag::GeneralSet { set } => write!(f, "set ({set})"),
        }
    }
}
