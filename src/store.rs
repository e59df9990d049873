// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reading and writing the per-locale translation files.
//!
//! Translations live in `<root>/<locale>/<group>.json`. Each file holds
//! a JSON object in the configured [`Structure`].

use crate::key_tree::{flatten, sort_keys, sort_recursive, Structure, Tree};
use anyhow::{bail, Context};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

const EXTENSION: &str = "json";

/// What [`TranslationStore::write`] did to the file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Deleted,
    /// The data was empty and there was no file to delete.
    Absent,
}

#[derive(Debug, Clone)]
pub struct TranslationStore {
    root: PathBuf,
    structure: Structure,
}

impl TranslationStore {
    pub fn new(root: impl Into<PathBuf>, structure: Structure) -> Self {
        Self {
            root: root.into(),
            structure,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn structure(&self) -> Structure {
        self.structure
    }

    /// Path of the file holding `group` for `locale`.
    pub fn group_path(&self, locale: &str, group: &str) -> PathBuf {
        self.root
            .join(locale)
            .join(format!("{group}.{EXTENSION}"))
    }

    /// Like [`Self::group_path`], but fails unless the file lies
    /// directly in the locale directory.
    fn checked_group_path(&self, locale: &str, group: &str) -> anyhow::Result<PathBuf> {
        check_name("locale", locale)?;
        check_name("group", group)?;
        Ok(self.group_path(locale, group))
    }

    /// Read the translations of `group` for `locale`.
    ///
    /// A missing file reads as an empty mapping.
    pub fn read(&self, locale: &str, group: &str) -> anyhow::Result<Tree> {
        let path = self.checked_group_path(locale, group)?;
        if !path.exists() {
            return Ok(Tree::new());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Could not parse {} as JSON", path.display()))?;
        match value {
            Value::Object(tree) => Ok(tree),
            _ => bail!("Root of {} must be a JSON object", path.display()),
        }
    }

    /// Write the translations of `group` for `locale`.
    ///
    /// The data is sorted according to the configured structure. Empty
    /// data removes the file instead.
    pub fn write(&self, locale: &str, group: &str, data: &Tree) -> anyhow::Result<WriteOutcome> {
        let path = self.checked_group_path(locale, group)?;

        if data.is_empty() {
            if !path.exists() {
                return Ok(WriteOutcome::Absent);
            }
            fs::remove_file(&path)
                .with_context(|| format!("Could not delete {}", path.display()))?;
            log::debug!("Deleted {}", path.display());
            return Ok(WriteOutcome::Deleted);
        }

        let sorted = match self.structure {
            Structure::Flat => sort_keys(data),
            Structure::Nested => sort_recursive(data),
        };
        if let Some(directory) = path.parent() {
            fs::create_dir_all(directory)
                .with_context(|| format!("Could not create {}", directory.display()))?;
        }
        let content =
            serde_json::to_string_pretty(&sorted).context("Could not serialize translations")?;
        fs::write(&path, format!("{content}\n"))
            .with_context(|| format!("Could not write {}", path.display()))?;
        log::debug!("Wrote {} keys to {}", sorted.len(), path.display());
        Ok(WriteOutcome::Written)
    }

    /// Names of all groups stored for `locale`.
    pub fn list_groups(&self, locale: &str) -> anyhow::Result<BTreeSet<String>> {
        check_name("locale", locale)?;
        let directory = self.root.join(locale);
        if !directory.is_dir() {
            return Ok(BTreeSet::new());
        }
        let mut groups = BTreeSet::new();
        for entry in fs::read_dir(&directory)
            .with_context(|| format!("Could not list {}", directory.display()))?
        {
            let path = entry?.path();
            if !path.is_file() || path.extension() != Some(EXTENSION.as_ref()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                groups.insert(String::from(stem));
            }
        }
        Ok(groups)
    }

    /// All translations of `locale` as one flat map keyed by
    /// `group.key`.
    pub fn read_locale(&self, locale: &str) -> anyhow::Result<Tree> {
        let mut translations = Tree::new();
        for group in self.list_groups(locale)? {
            let data = self.read(locale, &group)?;
            let mut prefixed = Tree::new();
            prefixed.insert(group, Value::Object(data));
            translations.extend(flatten(&prefixed));
        }
        Ok(translations)
    }

    /// Names of the locale directories under the root.
    ///
    /// Directories listed in `skip` (e.g. the export directory when it
    /// lives inside the root) are left out.
    pub fn detect_locales(&self, skip: &[&Path]) -> anyhow::Result<BTreeSet<String>> {
        if !self.root.is_dir() {
            return Ok(BTreeSet::new());
        }
        let mut locales = BTreeSet::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Could not list {}", self.root.display()))?
        {
            let path = entry?.path();
            if !path.is_dir() || skip.iter().any(|skipped| same_path(&path, skipped)) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                locales.insert(String::from(name));
            }
        }
        Ok(locales)
    }
}

/// Locale and group names are single, plain path components.
fn check_name(kind: &str, name: &str) -> anyhow::Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => bail!("Invalid {kind} name {name:?}"),
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
