// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! The line-oriented `contents` manifest.
//!
//! Each line is a sequence of `key=value` tokens separated by single
//! spaces. Inside a value, `\ ` escapes a space, `\n` a newline and
//! `\\` a backslash. A duplicate key on a line warns and the first
//! occurrence wins; an unknown `type` warns and the line is skipped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use murex_id::ContentsEntry;

use crate::error::{Error, Result};

#[cfg(test)]
#[path = "./contents_test.rs"]
mod contents_test;

/// Tokenise one manifest line; `None` for malformed lines.
fn tokenise_line(line: &str) -> Option<BTreeMap<String, String>> {
    let mut tokens = BTreeMap::new();
    let mut chars = line.chars().peekable();
    loop {
        if chars.peek().is_none() {
            return Some(tokens);
        }
        let mut key = String::new();
        loop {
            match chars.next() {
                Some('=') => break,
                Some(c) => key.push(c),
                None => return None,
            }
        }
        let mut value = String::new();
        loop {
            match chars.next() {
                Some('\\') => match chars.next() {
                    Some('n') => value.push('\n'),
                    Some(c) => value.push(c),
                    None => return None,
                },
                Some(' ') => break,
                Some(c) => value.push(c),
                None => break,
            }
        }
        if tokens.contains_key(&key) {
            tracing::warn!(line, key, "duplicate token, first value wins");
        } else {
            tokens.insert(key, value);
        }
    }
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ' ' => out.push_str("\\ "),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Render one entry as a manifest line.
pub fn render_entry(entry: &ContentsEntry) -> String {
    match entry {
        ContentsEntry::File { path, md5, mtime } => format!(
            "type=file path={} md5={md5} mtime={mtime}",
            escape_value(&path.display().to_string()),
        ),
        ContentsEntry::Dir { path } => {
            format!("type=dir path={}", escape_value(&path.display().to_string()))
        }
        ContentsEntry::Sym {
            path,
            target,
            mtime,
        } => format!(
            "type=sym path={} target={} mtime={mtime}",
            escape_value(&path.display().to_string()),
            escape_value(&target.display().to_string()),
        ),
    }
}

fn entry_from_tokens(line: &str, tokens: &BTreeMap<String, String>) -> Option<ContentsEntry> {
    let require = |key: &str| -> Option<&String> {
        let found = tokens.get(key);
        if found.is_none() {
            tracing::warn!(line, key, "missing key");
        }
        found
    };

    let entry_type = require("type")?;
    let path = PathBuf::from(require("path")?);
    match entry_type.as_str() {
        "file" => {
            let md5 = require("md5")?.clone();
            let mtime = require("mtime")?.parse().ok().or_else(|| {
                tracing::warn!(line, "unparseable mtime");
                None
            })?;
            Some(ContentsEntry::File { path, md5, mtime })
        }
        "dir" => Some(ContentsEntry::Dir { path }),
        "sym" => {
            let target = PathBuf::from(require("target")?);
            let mtime = require("mtime")?.parse().ok().or_else(|| {
                tracing::warn!(line, "unparseable mtime");
                None
            })?;
            Some(ContentsEntry::Sym {
                path,
                target,
                mtime,
            })
        }
        other => {
            tracing::warn!(line, entry_type = other, "unknown type, skipping");
            None
        }
    }
}

/// Parse a manifest line into an entry; malformed or unknown lines
/// warn and yield `None`.
pub fn parse_line(line: &str) -> Option<ContentsEntry> {
    let tokens = match tokenise_line(line) {
        Some(tokens) => tokens,
        None => {
            tracing::warn!(line, "malformed contents line");
            return None;
        }
    };
    entry_from_tokens(line, &tokens)
}

/// Read every well-formed entry of a manifest file.
pub fn parse_contents_file(path: &Path) -> Result<Vec<ContentsEntry>> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_owned(),
        source,
    })?;
    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_line)
        .collect())
}

/// The md5 digest of a file's contents, in the manifest's hex form.
pub fn file_md5(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_owned(),
        source,
    })?;
    Ok(format!("{:x}", md5::compute(bytes)))
}

/// Write a manifest file recording the given entries.
pub fn write_contents_file(path: &Path, entries: &[ContentsEntry]) -> Result<()> {
    let mut text = String::new();
    for entry in entries {
        text.push_str(&render_entry(entry));
        text.push('\n');
    }
    std::fs::write(path, text).map_err(|source| Error::Write {
        path: path.to_owned(),
        source,
    })
}
