// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

#[cfg(test)]
#[path = "./config_file_test.rs"]
mod config_file_test;

/// A `key = value` configuration file.
///
/// Blank lines and `#` comments are ignored; whitespace around keys,
/// values and the `=` is trimmed; a repeated key keeps its last
/// value.
#[derive(Debug, Clone, Default)]
pub struct KeyValueConfigFile {
    values: BTreeMap<String, String>,
}

impl KeyValueConfigFile {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_owned(),
            source,
        })?;
        let mut values = BTreeMap::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::configuration(
                    path,
                    format!("line {} has no '='", index + 1),
                ));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::configuration(
                    path,
                    format!("line {} has an empty key", index + 1),
                ));
            }
            values.insert(key.to_owned(), value.trim().to_owned());
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
