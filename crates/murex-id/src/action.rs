// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::sync::Arc;

use murex_foundation::name::RepositoryNameBuf;

use crate::package_id::PackageID;

/// The kinds of action a package may support.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Fetch,
    PretendFetch,
    Pretend,
    Info,
    Config,
    Install,
    Uninstall,
}

/// The answer to a `want_phase` query during an install.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WantPhase {
    Continue,
    Skip,
    Abort,
}

/// Routes an action's textual output; consumers decide rendering.
pub trait OutputManager: Send {
    fn stdout(&mut self, message: &str);
    fn stderr(&mut self, message: &str);
    /// Called once when the surrounding operation succeeds.
    fn succeeded(&mut self) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardOutput;

impl OutputManager for DiscardOutput {
    fn stdout(&mut self, _message: &str) {}

    fn stderr(&mut self, _message: &str) {}
}

/// Details of one failed source inside a fetch action.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FetchActionFailure {
    pub target_file: String,
    pub requires_manual_fetching: bool,
    pub failed_automatic_fetching: bool,
    pub failed_integrity_checks: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct FetchActionOptions {
    /// Also fetch sources only needed under disabled choices.
    pub fetch_unneeded: bool,
    /// Keep partial downloads for resumption.
    pub safe_resume: bool,
}

pub struct FetchAction<'a> {
    pub options: FetchActionOptions,
    pub output_manager: Box<dyn OutputManager + 'a>,
}

pub struct PretendFetchAction {
    pub options: FetchActionOptions,
}

pub struct PretendAction<'a> {
    pub destination: RepositoryNameBuf,
    pub output_manager: Box<dyn OutputManager + 'a>,
}

pub struct InfoAction<'a> {
    pub output_manager: Box<dyn OutputManager + 'a>,
}

pub struct ConfigAction<'a> {
    pub output_manager: Box<dyn OutputManager + 'a>,
}

/// Install a package into a destination repository.
pub struct InstallAction<'a> {
    pub destination: RepositoryNameBuf,
    /// Installed instances this install replaces.
    pub replacing: Vec<Arc<dyn PackageID>>,
    /// Called for each replaced instance once the new content is in
    /// place.
    pub perform_uninstall: Box<dyn FnMut(&dyn PackageID) -> crate::error::Result<()> + 'a>,
    /// Consulted before each build phase runs.
    pub want_phase: Box<dyn FnMut(&str) -> WantPhase + 'a>,
    pub output_manager: Box<dyn OutputManager + 'a>,
}

/// Remove an installed package.
pub struct UninstallAction<'a> {
    /// Space-separated config-protect specification in effect.
    pub config_protect: String,
    /// The instance (if any) whose install is replacing this one.
    pub if_for_install: Option<Arc<dyn PackageID>>,
    pub output_manager: Box<dyn OutputManager + 'a>,
}

/// One action to be performed by [`PackageID::perform_action`].
pub enum Action<'a> {
    Fetch(FetchAction<'a>),
    PretendFetch(PretendFetchAction),
    Pretend(PretendAction<'a>),
    Info(InfoAction<'a>),
    Config(ConfigAction<'a>),
    Install(InstallAction<'a>),
    Uninstall(UninstallAction<'a>),
}

impl Action<'_> {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Fetch(_) => ActionKind::Fetch,
            Action::PretendFetch(_) => ActionKind::PretendFetch,
            Action::Pretend(_) => ActionKind::Pretend,
            Action::Info(_) => ActionKind::Info,
            Action::Config(_) => ActionKind::Config,
            Action::Install(_) => ActionKind::Install,
            Action::Uninstall(_) => ActionKind::Uninstall,
        }
    }
}
