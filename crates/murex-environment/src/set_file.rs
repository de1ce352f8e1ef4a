// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! Named collections of atoms stored in files.
//!
//! Three formats exist. *Simple* files hold one atom per line, with
//! category-less tokens read as set references. *murex-conf* files
//! prefix each line with an operator: `*` includes unconditionally,
//! `?` includes when any version of the package is installed, and
//! `?:` includes when an installed instance matches the line's slot
//! requirement. *murex-bash* files are executed, and their standard
//! output is read as murex-conf.

use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;

use murex_depspec::{NamedSetDepSpec, PackageDepSpec, ParseOptions, SetSpec};
use murex_foundation::name::{SetName, SetNameBuf};

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::match_package::MatchPackageOptions;
use crate::selection::{Filter, Generator, Selection};

#[cfg(test)]
#[path = "./set_file_test.rs"]
mod set_file_test;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SetFileType {
    Simple,
    MurexConf,
    MurexBash,
}

/// How `?` and `?:` lines and bare set references behave.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SetFileSetOperatorMode {
    /// Operators keep their conditional meaning.
    Natural,
    /// The set was named with a trailing `*`: conditional operators
    /// include unconditionally and set references become starred.
    Star,
}

pub struct SetFileParams<'env> {
    pub file_name: PathBuf,
    pub file_type: SetFileType,
    pub set_operator_mode: SetFileSetOperatorMode,
    pub parse_options: ParseOptions,
    pub environment: Option<&'env dyn Environment>,
}

/// One set file, lazily parsed, editable in place for the writable
/// formats.
pub struct SetFile<'env> {
    params: SetFileParams<'env>,
    lines: Mutex<Vec<String>>,
    contents: Mutex<Option<SetSpec>>,
}

impl<'env> SetFile<'env> {
    /// Read (or for bash sets, run) the file. A missing file yields
    /// an empty set.
    pub fn new(params: SetFileParams<'env>) -> Result<Self> {
        let lines = match params.file_type {
            SetFileType::Simple | SetFileType::MurexConf => read_lines(&params.file_name)?,
            SetFileType::MurexBash => run_bash_set(&params.file_name)?,
        };
        Ok(Self {
            params,
            lines: Mutex::new(lines),
            contents: Mutex::new(None),
        })
    }

    /// The parsed contents, cached until the next edit.
    pub fn contents(&self) -> SetSpec {
        let mut cached = self.contents.lock().expect("set file contents lock poisoned");
        if cached.is_none() {
            *cached = Some(self.create_contents());
        }
        cached.clone().expect("just populated")
    }

    /// Append a line unless an identical one is already present.
    pub fn add(&self, line: &str) -> Result<bool> {
        if self.params.file_type == SetFileType::MurexBash {
            return Err(Error::SetNotWriteable {
                name: self.params.file_name.display().to_string(),
            });
        }
        let mut lines = self.lines.lock().expect("set file lines lock poisoned");
        if lines.iter().any(|l| l == line) {
            return Ok(false);
        }
        lines.push(line.to_owned());
        *self.contents.lock().expect("set file contents lock poisoned") = None;
        Ok(true)
    }

    /// Remove every line whose atom token equals `token`.
    pub fn remove(&self, token: &str) -> Result<bool> {
        if self.params.file_type == SetFileType::MurexBash {
            return Err(Error::SetNotWriteable {
                name: self.params.file_name.display().to_string(),
            });
        }
        let mut lines = self.lines.lock().expect("set file lines lock poisoned");
        let before = lines.len();
        lines.retain(|line| {
            let mut tokens = line.split_whitespace();
            match (tokens.next(), tokens.next()) {
                (Some(op), Some(atom)) if is_operator(op) => atom != token,
                (Some(atom), _) => atom != token,
                (None, _) => true,
            }
        });
        let removed = lines.len() != before;
        if removed {
            *self.contents.lock().expect("set file contents lock poisoned") = None;
        }
        Ok(removed)
    }

    /// Write the current lines back to the file.
    pub fn rewrite(&self) -> Result<()> {
        if self.params.file_type == SetFileType::MurexBash {
            return Err(Error::SetNotWriteable {
                name: self.params.file_name.display().to_string(),
            });
        }
        let lines = self.lines.lock().expect("set file lines lock poisoned");
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        std::fs::write(&self.params.file_name, text).map_err(|source| Error::Write {
            path: self.params.file_name.clone(),
            source,
        })
    }

    fn create_contents(&self) -> SetSpec {
        let lines = self.lines.lock().expect("set file lines lock poisoned");
        let mut children = Vec::new();
        for line in lines.iter() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let result = match self.params.file_type {
                SetFileType::Simple => self.one_simple_line(line),
                SetFileType::MurexConf | SetFileType::MurexBash => self.one_conf_line(line),
            };
            match result {
                Ok(Some(child)) => children.push(child),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        file = %self.params.file_name.display(),
                        line,
                        error = %err,
                        "ignoring unparseable set line"
                    );
                }
            }
        }
        SetSpec::All(children)
    }

    fn one_simple_line(&self, line: &str) -> Result<Option<SetSpec>> {
        if !line.contains('/') {
            return Ok(Some(self.named_set_child(line)?));
        }
        let spec = PackageDepSpec::parse(line, &self.params.parse_options)?;
        Ok(Some(SetSpec::Package(spec)))
    }

    fn one_conf_line(&self, line: &str) -> Result<Option<SetSpec>> {
        let mut tokens = line.split_whitespace();
        let first = tokens.next().expect("blank lines are filtered out");
        let (operator, atom) = if is_operator(first) {
            match tokens.next() {
                Some(atom) => (first, atom),
                None => {
                    tracing::warn!(line, "operator with no atom");
                    return Ok(None);
                }
            }
        } else {
            tracing::warn!(line, "line should start with '*', '?' or '?:', assuming '*'");
            ("*", first)
        };
        if tokens.next().is_some() {
            tracing::warn!(line, "trailing tokens ignored");
        }

        let star_mode = self.params.set_operator_mode == SetFileSetOperatorMode::Star;
        match operator {
            "*" => self.include_atom(atom),
            // in star mode the conditional operators include
            // unconditionally, set references and all
            "?" | "?:" if star_mode => self.include_atom(atom),
            "?" => self.conditional_include(atom, line, false),
            "?:" => self.conditional_include(atom, line, true),
            _ => unreachable!("is_operator admits only the three operators"),
        }
    }

    fn include_atom(&self, atom: &str) -> Result<Option<SetSpec>> {
        if !atom.contains('/') {
            return Ok(Some(self.named_set_child(atom)?));
        }
        let spec = PackageDepSpec::parse(atom, &self.params.parse_options)?;
        Ok(Some(SetSpec::Package(spec)))
    }

    /// `?` includes when any version of the named package is
    /// installed; `?:` additionally keeps the line's slot
    /// requirement when asking.
    fn conditional_include(
        &self,
        atom: &str,
        line: &str,
        with_slot: bool,
    ) -> Result<Option<SetSpec>> {
        if !atom.contains('/') {
            tracing::warn!(line, "'?' operators may not be used with a set name");
            return Ok(None);
        }
        let spec = PackageDepSpec::parse(atom, &self.params.parse_options)?;
        let Some(name) = spec.package_name() else {
            tracing::warn!(line, "'?' operators need an unambiguous package name");
            return Ok(None);
        };
        let Some(env) = self.params.environment else {
            tracing::warn!(line, "'?' operators need an environment");
            return Ok(None);
        };

        let query = if with_slot {
            // slot wildcards degrade to "any installed instance"
            spec.to_name_and_slot_only()
        } else {
            PackageDepSpec::builder()
                .package(name.clone())
                .build()
                .expect("name is always set")
        };
        let installed = Selection::SomeArbitraryVersion(
            Generator::Matches(query, MatchPackageOptions::default())
                .filtered(Filter::InstalledAtRoot),
        )
        .execute(env)
        .unwrap_or_default();
        if installed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(SetSpec::Package(spec)))
        }
    }

    fn named_set_child(&self, token: &str) -> Result<SetSpec> {
        let name: SetNameBuf = token.trim_start_matches('@').parse()?;
        let name = match self.params.set_operator_mode {
            SetFileSetOperatorMode::Natural => name,
            SetFileSetOperatorMode::Star => name.with_star(),
        };
        Ok(SetSpec::NamedSet(NamedSetDepSpec { name }))
    }
}

fn is_operator(token: &str) -> bool {
    matches!(token, "*" | "?" | "?:")
}

fn read_lines(path: &std::path::Path) -> Result<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text.lines().map(str::to_owned).collect()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "set file does not exist, treating as empty");
            Ok(Vec::new())
        }
        Err(source) => Err(Error::Read {
            path: path.to_owned(),
            source,
        }),
    }
}

fn run_bash_set(path: &std::path::Path) -> Result<Vec<String>> {
    let output = Command::new("bash")
        .arg(path)
        .output()
        .map_err(|source| Error::Read {
            path: path.to_owned(),
            source,
        })?;
    if !output.status.success() {
        tracing::warn!(
            path = %path.display(),
            status = %output.status,
            "set script failed, yielding an empty set"
        );
        return Ok(Vec::new());
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_owned)
        .collect())
}

/// Split a possibly-starred set name into its base and the operator
/// mode it selects.
pub fn base_set_name_and_mode(name: &SetName) -> (SetNameBuf, SetFileSetOperatorMode) {
    if name.is_star_mode() {
        (name.base_name().to_owned(), SetFileSetOperatorMode::Star)
    } else {
        (name.to_owned(), SetFileSetOperatorMode::Natural)
    }
}
