// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! The image-to-root transfer engine.
//!
//! `check` walks the image without touching the root and reports
//! every entry that could not merge; `merge` performs the transfer
//! in a deterministic depth-first pre-order and stops at the first
//! failure. The uninstaller removes the contents of any replaced
//! instance in its own pass; the merger only ever writes new state.

use std::collections::BTreeSet;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use filetime::FileTime;
use murex_environment::{Environment, Hook};
use murex_id::OutputManager;
use nix::unistd::{Gid, Uid};

use crate::error::{Error, Result};

#[cfg(test)]
#[path = "./merger_test.rs"]
mod merger_test;

/// Behaviour switches for one merge.
#[derive(Debug, Clone, Copy, Default)]
pub struct FSMergerOptions {
    /// Rewrite absolute symlink targets that point into the image so
    /// that they point into the root instead.
    pub rewrite_symlinks: bool,
    /// Permit image directories with no contents.
    pub allow_empty_dirs: bool,
    /// Give merged files the mtime they carry in the image.
    pub preserve_mtimes: bool,
}

/// The per-file ownership decision: `None` keeps what the image has.
pub type NewIdsCallback<'a> = Box<dyn Fn(&Path) -> (Option<u32>, Option<u32>) + 'a>;

/// Decides whether a destination file is configuration that must not
/// be overwritten in place.
pub type ConfigProtectCallback<'a> = Box<dyn Fn(&Path, &Path) -> bool + 'a>;

/// Produces the alternative destination for a protected file.
pub type ConfigProtectNameCallback<'a> = Box<dyn Fn(&Path, &Path) -> PathBuf + 'a>;

pub struct FSMergerParams<'a> {
    pub environment: &'a dyn Environment,
    pub image: PathBuf,
    pub root: PathBuf,
    /// Merged entries land under `root/install_under`.
    pub install_under: PathBuf,
    pub options: FSMergerOptions,
    pub no_chown: bool,
    /// Image files older than this are clamped up to it.
    pub fix_mtimes_before: Option<SystemTime>,
    pub get_new_ids_or_minus_one: NewIdsCallback<'a>,
    pub config_protect: ConfigProtectCallback<'a>,
    pub make_config_protect_name: ConfigProtectNameCallback<'a>,
    pub output_manager: Box<dyn OutputManager + 'a>,
}

impl<'a> FSMergerParams<'a> {
    /// Defaults: merge directly under the root, keep image ownership
    /// choices to the caller, protect nothing.
    pub fn new(
        environment: &'a dyn Environment,
        image: impl Into<PathBuf>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            environment,
            image: image.into(),
            root: root.into(),
            install_under: PathBuf::from("/"),
            options: FSMergerOptions::default(),
            no_chown: false,
            fix_mtimes_before: None,
            get_new_ids_or_minus_one: Box::new(|_| (None, None)),
            config_protect: Box::new(|_, _| false),
            make_config_protect_name: Box::new(default_config_protect_name),
            output_manager: Box::new(murex_id::DiscardOutput),
        }
    }
}

/// The conventional protected name: `file.cfgpro`, then
/// `file.cfgpro.1` and so on until a free name is found.
pub fn default_config_protect_name(_src: &Path, dst: &Path) -> PathBuf {
    let base = {
        let mut name = dst.as_os_str().to_owned();
        name.push(".cfgpro");
        PathBuf::from(name)
    };
    if base.symlink_metadata().is_err() {
        return base;
    }
    let mut counter = 1u32;
    loop {
        let mut name = base.as_os_str().to_owned();
        name.push(format!(".{counter}"));
        let candidate = PathBuf::from(name);
        if candidate.symlink_metadata().is_err() {
            return candidate;
        }
        counter += 1;
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum SourceKind {
    Dir,
    File,
    Sym,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum LiveKind {
    Nothing,
    Dir,
    File,
    Sym,
}

enum EntryPlan {
    CreateDir,
    UseExistingDir,
    InstallFile { unlink_first: bool, dst: PathBuf },
    InstallSym { unlink_first: bool },
    Refuse(String),
}

/// The transfer engine; see the module notes.
pub struct FSMerger<'a> {
    params: FSMergerParams<'a>,
    merged_entries: BTreeSet<PathBuf>,
}

impl<'a> FSMerger<'a> {
    pub fn new(params: FSMergerParams<'a>) -> Self {
        Self {
            params,
            merged_entries: BTreeSet::new(),
        }
    }

    /// Every destination path written by the last `merge`.
    pub fn merged_entries(&self) -> &BTreeSet<PathBuf> {
        &self.merged_entries
    }

    fn destination_base(&self) -> PathBuf {
        let under = self
            .params
            .install_under
            .strip_prefix("/")
            .unwrap_or(&self.params.install_under);
        self.params.root.join(under)
    }

    fn run_hook(&self, name: &str, src: Option<&Path>, dst: Option<&Path>) -> i32 {
        let mut hook = Hook::new(name)
            .with("IMAGE", self.params.image.display().to_string())
            .with("ROOT", self.params.root.display().to_string());
        if let Some(src) = src {
            hook = hook.with("INSTALL_SOURCE", src.display().to_string());
        }
        if let Some(dst) = dst {
            hook = hook.with("INSTALL_DESTINATION", dst.display().to_string());
        }
        self.params.environment.perform_hook(&hook).max_exit_status
    }

    /// Dry-run the whole merge, reporting every problem found.
    pub fn check(&mut self) -> Result<()> {
        let mut failures = Vec::new();
        if self.run_hook("merger_check_pre", None, None) != 0 {
            failures.push("merger_check_pre hook failed".to_string());
        }

        match self.sorted_entries(&self.params.image.clone()) {
            Ok(entries) if entries.is_empty() && !self.params.options.allow_empty_dirs => {
                failures.push(format!(
                    "image '{}' is empty",
                    self.params.image.display()
                ));
            }
            Ok(_) => {}
            Err(err) => failures.push(err.to_string()),
        }

        let image = self.params.image.clone();
        let dst = self.destination_base();
        self.check_dir(&image, &dst, &mut failures);

        if self.run_hook("merger_check_post", None, None) != 0 {
            failures.push("merger_check_post hook failed".to_string());
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::CheckFailed { failures })
        }
    }

    /// Perform the transfer; aborts on the first failure.
    pub fn merge(&mut self) -> Result<()> {
        self.merged_entries.clear();
        let status = self.run_hook("merger_install_pre", None, None);
        if status != 0 {
            return Err(Error::HookAborted {
                hook: "merger_install_pre".to_string(),
                status,
            });
        }

        let image = self.params.image.clone();
        let dst = self.destination_base();
        std::fs::create_dir_all(&dst)
            .map_err(|source| Error::io("create destination root", &dst, source))?;
        self.merge_dir(&image, &dst)?;

        let status = self.run_hook("merger_install_post", None, None);
        if status != 0 {
            return Err(Error::HookAborted {
                hook: "merger_install_post".to_string(),
                status,
            });
        }
        self.params.output_manager.succeeded();
        Ok(())
    }

    /// Directory entries in name order, for a deterministic walk.
    fn sorted_entries(&self, dir: &Path) -> Result<Vec<(String, SourceKind, PathBuf)>> {
        let mut out = Vec::new();
        let entries = std::fs::read_dir(dir)
            .map_err(|source| Error::io("read image directory", dir, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| Error::io("read image directory", dir, source))?;
            let path = entry.path();
            let metadata = path
                .symlink_metadata()
                .map_err(|source| Error::io("stat image entry", &path, source))?;
            let kind = if metadata.file_type().is_symlink() {
                SourceKind::Sym
            } else if metadata.is_dir() {
                SourceKind::Dir
            } else {
                SourceKind::File
            };
            out.push((entry.file_name().to_string_lossy().into_owned(), kind, path));
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    fn live_kind(dst: &Path) -> LiveKind {
        match dst.symlink_metadata() {
            Err(_) => LiveKind::Nothing,
            Ok(metadata) if metadata.file_type().is_symlink() => LiveKind::Sym,
            Ok(metadata) if metadata.is_dir() => LiveKind::Dir,
            Ok(_) => LiveKind::File,
        }
    }

    fn plan_entry(&self, kind: SourceKind, src: &Path, dst: &Path) -> EntryPlan {
        let live = Self::live_kind(dst);
        match (kind, live) {
            (SourceKind::Dir, LiveKind::Nothing) => EntryPlan::CreateDir,
            (SourceKind::Dir, LiveKind::Dir) => EntryPlan::UseExistingDir,
            (SourceKind::Dir, LiveKind::File) => EntryPlan::Refuse(format!(
                "'{}' is a directory in the image but a file in the root",
                dst.display()
            )),
            (SourceKind::Dir, LiveKind::Sym) => match std::fs::metadata(dst) {
                Ok(metadata) if metadata.is_dir() => EntryPlan::UseExistingDir,
                Ok(_) => EntryPlan::Refuse(format!(
                    "'{}' is a symlink to a non-directory",
                    dst.display()
                )),
                Err(err)
                    if err.raw_os_error() == Some(nix::errno::Errno::ELOOP as i32) =>
                {
                    EntryPlan::Refuse(format!("'{}' is a symlink cycle", dst.display()))
                }
                Err(_) => EntryPlan::Refuse(format!(
                    "'{}' is a dangling symlink",
                    dst.display()
                )),
            },
            (SourceKind::File, LiveKind::Nothing) => EntryPlan::InstallFile {
                unlink_first: false,
                dst: dst.to_owned(),
            },
            (SourceKind::File, LiveKind::Dir) => {
                if (self.params.config_protect)(src, dst) {
                    EntryPlan::InstallFile {
                        unlink_first: false,
                        dst: (self.params.make_config_protect_name)(src, dst),
                    }
                } else {
                    EntryPlan::Refuse(format!(
                        "'{}' is a file in the image but a directory in the root",
                        dst.display()
                    ))
                }
            }
            (SourceKind::File, LiveKind::File) => {
                if (self.params.config_protect)(src, dst) && !files_identical(src, dst) {
                    EntryPlan::InstallFile {
                        unlink_first: false,
                        dst: (self.params.make_config_protect_name)(src, dst),
                    }
                } else {
                    EntryPlan::InstallFile {
                        unlink_first: true,
                        dst: dst.to_owned(),
                    }
                }
            }
            (SourceKind::File, LiveKind::Sym) => EntryPlan::InstallFile {
                unlink_first: true,
                dst: dst.to_owned(),
            },
            (SourceKind::Sym, LiveKind::Nothing) => EntryPlan::InstallSym {
                unlink_first: false,
            },
            (SourceKind::Sym, LiveKind::Dir) => EntryPlan::Refuse(format!(
                "'{}' is a symlink in the image but a directory in the root",
                dst.display()
            )),
            (SourceKind::Sym, LiveKind::File) | (SourceKind::Sym, LiveKind::Sym) => {
                EntryPlan::InstallSym { unlink_first: true }
            }
        }
    }

    fn check_dir(&self, image_dir: &Path, dst_dir: &Path, failures: &mut Vec<String>) {
        let entries = match self.sorted_entries(image_dir) {
            Ok(entries) => entries,
            Err(err) => {
                failures.push(err.to_string());
                return;
            }
        };
        for (name, kind, src) in entries {
            let dst = dst_dir.join(&name);
            if let EntryPlan::Refuse(message) = self.plan_entry(kind, &src, &dst) {
                failures.push(message);
            }
            if kind == SourceKind::Dir {
                match self.sorted_entries(&src) {
                    Ok(children)
                        if children.is_empty() && !self.params.options.allow_empty_dirs =>
                    {
                        failures.push(format!(
                            "image directory '{}' is empty",
                            src.display()
                        ));
                    }
                    Ok(_) => {}
                    Err(err) => failures.push(err.to_string()),
                }
                self.check_dir(&src, &dst, failures);
            }
        }
    }

    fn merge_dir(&mut self, image_dir: &Path, dst_dir: &Path) -> Result<()> {
        for (name, kind, src) in self.sorted_entries(image_dir)? {
            let dst = dst_dir.join(&name);
            match kind {
                SourceKind::Dir => {
                    self.entry_hooks("merger_install_dir", &src, &dst, |merger| {
                        merger.merge_one_dir(&src, &dst)
                    })?;
                    self.merge_dir(&src, &dst)?;
                }
                SourceKind::File => {
                    self.entry_hooks("merger_install_file", &src, &dst, |merger| {
                        merger.merge_one_file(&src, &dst)
                    })?;
                }
                SourceKind::Sym => {
                    self.entry_hooks("merger_install_sym", &src, &dst, |merger| {
                        merger.merge_one_sym(&src, &dst)
                    })?;
                }
            }
        }
        Ok(())
    }

    fn entry_hooks(
        &mut self,
        hook_base: &str,
        src: &Path,
        dst: &Path,
        action: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let pre = format!("{hook_base}_pre");
        let status = self.run_hook(&pre, Some(src), Some(dst));
        if status != 0 {
            return Err(Error::HookAborted { hook: pre, status });
        }
        action(self)?;
        let post = format!("{hook_base}_post");
        let status = self.run_hook(&post, Some(src), Some(dst));
        if status != 0 {
            return Err(Error::HookAborted { hook: post, status });
        }
        Ok(())
    }

    fn merge_one_dir(&mut self, src: &Path, dst: &Path) -> Result<()> {
        match self.plan_entry(SourceKind::Dir, src, dst) {
            EntryPlan::CreateDir => {
                tracing::trace!(src = %src.display(), dst = %dst.display(), "creating directory");
                std::fs::create_dir(dst)
                    .map_err(|source| Error::io("create directory", dst, source))?;
                self.apply_ownership(src, dst, false)?;
                self.apply_mode(src, dst)?;
                self.merged_entries.insert(dst.to_owned());
                Ok(())
            }
            EntryPlan::UseExistingDir => {
                self.merged_entries.insert(dst.to_owned());
                Ok(())
            }
            EntryPlan::Refuse(message) => Err(Error::merge(dst, message)),
            _ => Err(Error::merge(dst, "impossible plan for a directory")),
        }
    }

    fn merge_one_file(&mut self, src: &Path, dst: &Path) -> Result<()> {
        match self.plan_entry(SourceKind::File, src, dst) {
            EntryPlan::InstallFile { unlink_first, dst } => {
                tracing::trace!(src = %src.display(), dst = %dst.display(), "installing file");
                if unlink_first {
                    std::fs::remove_file(&dst)
                        .map_err(|source| Error::io("unlink existing entry", &dst, source))?;
                }
                std::fs::copy(src, &dst)
                    .map_err(|source| Error::io("install file", &dst, source))?;
                self.apply_ownership(src, &dst, false)?;
                self.apply_mode(src, &dst)?;
                self.apply_mtime(src, &dst)?;
                self.merged_entries.insert(dst);
                Ok(())
            }
            EntryPlan::Refuse(message) => Err(Error::merge(dst, message)),
            _ => Err(Error::merge(dst, "impossible plan for a file")),
        }
    }

    fn merge_one_sym(&mut self, src: &Path, dst: &Path) -> Result<()> {
        match self.plan_entry(SourceKind::Sym, src, dst) {
            EntryPlan::InstallSym { unlink_first } => {
                let mut target = std::fs::read_link(src)
                    .map_err(|source| Error::io("read symlink", src, source))?;
                if self.params.options.rewrite_symlinks && target.is_absolute() {
                    if let Ok(rel) = target.strip_prefix(&self.params.image) {
                        let rewritten = self.params.root.join(rel);
                        tracing::trace!(
                            old = %target.display(),
                            new = %rewritten.display(),
                            "rewriting symlink target"
                        );
                        target = rewritten;
                    }
                }
                tracing::trace!(dst = %dst.display(), target = %target.display(), "installing symlink");
                if unlink_first {
                    std::fs::remove_file(dst)
                        .map_err(|source| Error::io("unlink existing entry", dst, source))?;
                }
                std::os::unix::fs::symlink(&target, dst)
                    .map_err(|source| Error::io("create symlink", dst, source))?;
                self.apply_ownership(src, dst, true)?;
                self.merged_entries.insert(dst.to_owned());
                Ok(())
            }
            EntryPlan::Refuse(message) => Err(Error::merge(dst, message)),
            _ => Err(Error::merge(dst, "impossible plan for a symlink")),
        }
    }

    fn apply_ownership(&self, src: &Path, dst: &Path, is_symlink: bool) -> Result<()> {
        if self.params.no_chown {
            return Ok(());
        }
        let (uid, gid) = (self.params.get_new_ids_or_minus_one)(src);
        if uid.is_none() && gid.is_none() {
            return Ok(());
        }
        if is_symlink {
            std::os::unix::fs::lchown(dst, uid, gid)
                .map_err(|source| Error::io("change symlink ownership", dst, source))
        } else {
            nix::unistd::chown(dst, uid.map(Uid::from_raw), gid.map(Gid::from_raw))
                .map_err(|errno| Error::io("change ownership", dst, errno.into()))
        }
    }

    fn apply_mode(&self, src: &Path, dst: &Path) -> Result<()> {
        let metadata = src
            .symlink_metadata()
            .map_err(|source| Error::io("stat image entry", src, source))?;
        std::fs::set_permissions(dst, std::fs::Permissions::from_mode(metadata.mode()))
            .map_err(|source| Error::io("set permissions", dst, source))
    }

    /// Give a merged file the image's mtime, clamped up to
    /// `fix_mtimes_before` when set. Directory mtimes are never
    /// touched.
    fn apply_mtime(&self, src: &Path, dst: &Path) -> Result<()> {
        let metadata = src
            .symlink_metadata()
            .map_err(|source| Error::io("stat image entry", src, source))?;
        if !self.params.options.preserve_mtimes {
            return Ok(());
        }
        let mut mtime = FileTime::from_last_modification_time(&metadata);

        if let Some(fix_before) = self.params.fix_mtimes_before {
            let reference = FileTime::from_system_time(fix_before);
            if mtime < reference {
                tracing::trace!(dst = %dst.display(), "clamping suspicious mtime");
                mtime = reference;
            }
        }

        filetime::set_file_mtime(dst, mtime)
            .map_err(|source| Error::io("set mtime", dst, source))?;
        Ok(())
    }
}

fn files_identical(a: &Path, b: &Path) -> bool {
    match (std::fs::read(a), std::fs::read(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
