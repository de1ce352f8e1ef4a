// Copyright (c) Contributors to the Murex project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/murexpm/murex

//! The NDBAM installed-package store.
//!
//! On disk:
//!
//! ```text
//! <location>/ndbam.conf
//! <location>/data/<package-dir>/<version:slot:magic>/contents
//! <location>/indices/categories/<cat>/<pkg> -> ../../../data/<package-dir>
//! <location>/indices/packages/<pkg>/<cat>   -> ../../../data/<package-dir>
//! ```
//!
//! Enumeration is lazy and cached. The top-level category cache is
//! guarded by one mutex; each category and package carries its own.
//! Locks are taken parent first, and a parent lock is released
//! before a child's is held for population.

pub mod config_file;
pub mod contents;
mod error;

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub use config_file::KeyValueConfigFile;
pub use contents::{file_md5, parse_contents_file, parse_line, render_entry, write_contents_file};
pub use error::{Error, Result};
use murex_foundation::name::{
    CategoryName,
    CategoryNameBuf,
    PackageNamePart,
    PackageNamePartBuf,
    QualifiedPackageName,
    SlotNameBuf,
};
use murex_foundation::version::VersionSpec;
use murex_id::{ContentsEntry, PackageID};


pub const NDBAM_FORMAT: &str = "1";

/// One installed instance as enumerated from the store.
#[derive(Debug, Clone)]
pub struct NDBAMEntry {
    pub name: QualifiedPackageName,
    pub version: VersionSpec,
    pub slot: SlotNameBuf,
    pub magic: String,
    pub fs_location: PathBuf,
}

#[derive(Default)]
struct PackageContents {
    entries: Mutex<Option<Vec<Arc<NDBAMEntry>>>>,
}

#[derive(Default)]
struct CategoryContentsInner {
    package_names: Option<BTreeSet<QualifiedPackageName>>,
    packages: HashMap<QualifiedPackageName, Option<Arc<PackageContents>>>,
}

#[derive(Default)]
struct CategoryContents {
    inner: Mutex<CategoryContentsInner>,
}

#[derive(Default)]
struct NDBAMState {
    category_names: Option<BTreeSet<CategoryNameBuf>>,
    categories: HashMap<CategoryNameBuf, Option<Arc<CategoryContents>>>,
}

/// The store handle. Shared across threads; see the module notes for
/// the locking discipline.
pub struct NDBAM {
    location: PathBuf,
    state: Mutex<NDBAMState>,
    categories_containing: Mutex<HashMap<PackageNamePartBuf, Arc<Mutex<Option<BTreeSet<CategoryNameBuf>>>>>>,
}

impl NDBAM {
    /// Open or create a store at `location`.
    ///
    /// An existing `ndbam.conf` must name format 1 and a repository
    /// format accepted by `check_format`. A non-empty directory
    /// without the conf file is an error; an empty or missing
    /// directory is initialised with a fresh skeleton recording
    /// `preferred_format`.
    pub fn new(
        location: &Path,
        check_format: &dyn Fn(&str) -> bool,
        preferred_format: &str,
    ) -> Result<Self> {
        let conf_path = location.join("ndbam.conf");
        if conf_path.exists() {
            let conf = KeyValueConfigFile::read(&conf_path)?;
            match conf.get("ndbam_format") {
                Some(NDBAM_FORMAT) => {}
                other => {
                    return Err(Error::configuration(
                        location,
                        format!("unsupported ndbam format '{}'", other.unwrap_or("")),
                    ))
                }
            }
            let repository_format = conf.get("repository_format").unwrap_or("");
            if !check_format(repository_format) {
                return Err(Error::configuration(
                    location,
                    format!("unsupported repository format '{repository_format}'"),
                ));
            }
        } else if location.exists()
            && location
                .read_dir()
                .map_err(|source| Error::Read {
                    path: location.to_owned(),
                    source,
                })?
                .next()
                .is_some()
        {
            return Err(Error::configuration(
                location,
                "directory is not empty and has no ndbam.conf",
            ));
        } else {
            Self::write_skeleton(location, preferred_format)?;
        }

        Ok(Self {
            location: location.to_owned(),
            state: Mutex::new(NDBAMState::default()),
            categories_containing: Mutex::new(HashMap::new()),
        })
    }

    fn write_skeleton(location: &Path, preferred_format: &str) -> Result<()> {
        for dir in [
            location.to_owned(),
            location.join("indices"),
            location.join("indices/categories"),
            location.join("indices/packages"),
            location.join("data"),
        ] {
            std::fs::create_dir_all(&dir).map_err(|source| Error::Write { path: dir, source })?;
        }
        let conf_path = location.join("ndbam.conf");
        std::fs::write(
            &conf_path,
            format!("ndbam_format = {NDBAM_FORMAT}\nrepository_format = {preferred_format}\n"),
        )
        .map_err(|source| Error::Write {
            path: conf_path,
            source,
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Every category with at least one index entry.
    pub fn category_names(&self) -> BTreeSet<CategoryNameBuf> {
        let mut state = self.state.lock().expect("ndbam state lock poisoned");
        if state.category_names.is_none() {
            let mut names = BTreeSet::new();
            for entry in read_index_dir(&self.location.join("indices/categories")) {
                match entry.parse::<CategoryNameBuf>() {
                    Ok(category) => {
                        names.insert(category.clone());
                        state.categories.entry(category).or_insert_with(|| {
                            Some(Arc::new(CategoryContents::default()))
                        });
                    }
                    Err(err) => {
                        tracing::warn!(directory = entry, error = %err, "skipping directory");
                    }
                }
            }
            state.category_names = Some(names);
        }
        state
            .category_names
            .clone()
            .expect("just populated")
    }

    pub fn has_category_named(&self, category: &CategoryName) -> bool {
        let mut state = self.state.lock().expect("ndbam state lock poisoned");
        if let Some(cached) = state.categories.get(category) {
            return cached.is_some();
        }
        if state.category_names.is_none() {
            let present = self
                .location
                .join("indices/categories")
                .join(category.as_str())
                .is_dir();
            let slot = if present {
                Some(Arc::new(CategoryContents::default()))
            } else {
                None
            };
            state.categories.insert(category.to_owned(), slot);
            return present;
        }
        false
    }

    fn category_contents(&self, category: &CategoryName) -> Result<Arc<CategoryContents>> {
        let state = self.state.lock().expect("ndbam state lock poisoned");
        match state.categories.get(category) {
            Some(Some(contents)) => Ok(Arc::clone(contents)),
            _ => Err(Error::Internal {
                message: format!(
                    "has_category_named({category}) was true but the cache entry is gone"
                ),
            }),
        }
    }

    /// Every package in a category.
    pub fn package_names(&self, category: &CategoryName) -> Result<BTreeSet<QualifiedPackageName>> {
        if !self.has_category_named(category) {
            return Ok(BTreeSet::new());
        }
        let contents = self.category_contents(category)?;
        let mut inner = contents.inner.lock().expect("category lock poisoned");
        if inner.package_names.is_none() {
            let mut names = BTreeSet::new();
            let dir = self
                .location
                .join("indices/categories")
                .join(category.as_str());
            for entry in read_index_dir(&dir) {
                match entry.parse::<PackageNamePartBuf>() {
                    Ok(package) => {
                        let name =
                            QualifiedPackageName::new(category.to_owned(), package);
                        names.insert(name.clone());
                        inner.packages.entry(name).or_insert_with(|| {
                            Some(Arc::new(PackageContents::default()))
                        });
                    }
                    Err(err) => {
                        tracing::warn!(directory = entry, error = %err, "skipping directory");
                    }
                }
            }
            inner.package_names = Some(names);
        }
        Ok(inner.package_names.clone().expect("just populated"))
    }

    pub fn has_package_named(&self, name: &QualifiedPackageName) -> Result<bool> {
        if !self.has_category_named(name.category.as_ref()) {
            return Ok(false);
        }
        let contents = self.category_contents(name.category.as_ref())?;
        let mut inner = contents.inner.lock().expect("category lock poisoned");
        if let Some(cached) = inner.packages.get(name) {
            return Ok(cached.is_some());
        }
        if inner.package_names.is_none() {
            let present = self
                .location
                .join("indices/categories")
                .join(name.category.as_str())
                .join(name.package.as_str())
                .is_dir();
            let slot = if present {
                Some(Arc::new(PackageContents::default()))
            } else {
                None
            };
            inner.packages.insert(name.clone(), slot);
            return Ok(present);
        }
        Ok(false)
    }

    /// Every installed instance of a package, ordered by version.
    pub fn entries(&self, name: &QualifiedPackageName) -> Result<Vec<Arc<NDBAMEntry>>> {
        if !self.has_package_named(name)? {
            return Ok(Vec::new());
        }
        let category = self.category_contents(name.category.as_ref())?;
        let package = {
            let inner = category.inner.lock().expect("category lock poisoned");
            match inner.packages.get(name) {
                Some(Some(package)) => Arc::clone(package),
                _ => {
                    return Err(Error::Internal {
                        message: format!(
                            "has_package_named({name}) was true but the cache entry is gone"
                        ),
                    })
                }
            }
        };

        let mut entries = package.entries.lock().expect("package lock poisoned");
        if entries.is_none() {
            let dir = self
                .location
                .join("indices/categories")
                .join(name.category.as_str())
                .join(name.package.as_str());
            let mut found = Vec::new();
            for instance in read_index_dir(&dir) {
                match parse_instance_dir_name(name, &dir.join(&instance), &instance) {
                    Ok(entry) => found.push(Arc::new(entry)),
                    Err(err) => {
                        tracing::warn!(
                            directory = instance,
                            error = %err,
                            "skipping instance directory"
                        );
                    }
                }
            }
            found.sort_by(|a, b| a.version.cmp(&b.version));
            *entries = Some(found);
        }
        Ok(entries.clone().expect("just populated"))
    }

    /// Categories that contain a package with this name part.
    pub fn category_names_containing_package(
        &self,
        package: &PackageNamePart,
    ) -> BTreeSet<CategoryNameBuf> {
        let cell = {
            let mut map = self
                .categories_containing
                .lock()
                .expect("ndbam cncp lock poisoned");
            Arc::clone(
                map.entry(package.to_owned())
                    .or_insert_with(|| Arc::new(Mutex::new(None))),
            )
        };
        let mut cached = cell.lock().expect("ndbam cncp cell lock poisoned");
        if cached.is_none() {
            let mut names = BTreeSet::new();
            let dir = self.location.join("indices/packages").join(package.as_str());
            if dir.is_dir() {
                for entry in read_index_dir(&dir) {
                    match entry.parse::<CategoryNameBuf>() {
                        Ok(category) => {
                            names.insert(category);
                        }
                        Err(err) => {
                            tracing::warn!(directory = entry, error = %err, "skipping directory");
                        }
                    }
                }
            }
            *cached = Some(names);
        }
        cached.clone().expect("just populated")
    }

    /// Create both index symlinks for a package's data directory.
    ///
    /// `data_dir_name` is the directory under `data/` that holds the
    /// package's instance directories.
    pub fn index(&self, name: &QualifiedPackageName, data_dir_name: &str) -> Result<()> {
        let target = format!("../../../data/{data_dir_name}");

        let category_side = self
            .location
            .join("indices/categories")
            .join(name.category.as_str());
        make_index_symlink(&category_side, name.package.as_str(), &target)?;

        let package_side = self
            .location
            .join("indices/packages")
            .join(name.package.as_str());
        make_index_symlink(&package_side, name.category.as_str(), &target)?;

        self.invalidate(name);
        Ok(())
    }

    /// Remove both index symlinks. The caller may delete the data
    /// directory only after this returns.
    pub fn deindex(&self, name: &QualifiedPackageName) -> Result<()> {
        let category_side = self
            .location
            .join("indices/categories")
            .join(name.category.as_str())
            .join(name.package.as_str());
        remove_if_exists(&category_side)?;

        let package_side = self
            .location
            .join("indices/packages")
            .join(name.package.as_str())
            .join(name.category.as_str());
        remove_if_exists(&package_side)?;

        self.invalidate(name);
        Ok(())
    }

    /// Drop cached state for a package after an index change.
    fn invalidate(&self, name: &QualifiedPackageName) {
        let mut state = self.state.lock().expect("ndbam state lock poisoned");
        state.category_names = None;
        state.categories.remove(&name.category);
        drop(state);
        self.categories_containing
            .lock()
            .expect("ndbam cncp lock poisoned")
            .remove(&name.package);
    }

    /// Drive the callbacks over an installed ID's contents manifest.
    ///
    /// A missing or irregular manifest warns and calls nothing.
    pub fn parse_contents(
        &self,
        id: &dyn PackageID,
        on_file: &mut dyn FnMut(&Path, &str, i64),
        on_dir: &mut dyn FnMut(&Path),
        on_sym: &mut dyn FnMut(&Path, &Path, i64),
    ) -> Result<()> {
        let Some(location_key) = id.fs_location_key() else {
            return Err(Error::Internal {
                message: format!(
                    "id '{}' has no filesystem location key",
                    id.canonical_form(murex_id::CanonicalForm::Full)
                ),
            });
        };
        let Some(dir) = location_key.as_path() else {
            return Err(Error::Internal {
                message: "filesystem location key is not a path".to_string(),
            });
        };
        let manifest = dir.join("contents");
        if !manifest.is_file() {
            tracing::warn!(path = %manifest.display(), "contents file is not a regular file");
            return Ok(());
        }
        for entry in parse_contents_file(&manifest)? {
            match entry {
                ContentsEntry::File { path, md5, mtime } => on_file(&path, &md5, mtime),
                ContentsEntry::Dir { path } => on_dir(&path),
                ContentsEntry::Sym {
                    path,
                    target,
                    mtime,
                } => on_sym(&path, &target, mtime),
            }
        }
        Ok(())
    }
}

/// Basenames under an index directory, skipping entries that can
/// never be index members.
fn read_index_dir(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('-') {
            continue;
        }
        // symlinks to directories count; anything else does not
        if !entry.path().is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort();
    names
}

fn parse_instance_dir_name(
    name: &QualifiedPackageName,
    path: &Path,
    basename: &str,
) -> Result<NDBAMEntry> {
    let tokens: Vec<&str> = basename.split(':').collect();
    if tokens.len() < 3 {
        return Err(Error::Internal {
            message: format!("'{basename}' contains fewer than three ':'-separated tokens"),
        });
    }
    Ok(NDBAMEntry {
        name: name.clone(),
        version: tokens[0].parse()?,
        slot: tokens[1].parse()?,
        magic: tokens[2].to_owned(),
        fs_location: path.canonicalize().unwrap_or_else(|_| path.to_owned()),
    })
}

fn make_index_symlink(dir: &Path, link_name: &str, target: &str) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| Error::Write {
        path: dir.to_owned(),
        source,
    })?;
    let link = dir.join(link_name);
    if link.symlink_metadata().is_ok() {
        return Ok(());
    }
    std::os::unix::fs::symlink(target, &link).map_err(|source| Error::Write {
        path: link,
        source,
    })
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(Error::Write {
            path: path.to_owned(),
            source,
        }),
    }
}
