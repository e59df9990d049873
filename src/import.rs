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

//! Loading translated PO files back into the translation files.
//!
//! Each document goes through these steps:
//!
//! 1. fuzzy entries are dropped, unless asked for,
//! 2. entries not matching the `only` patterns are dropped,
//! 3. the remaining entries are split into groups,
//! 4. each group is merged with the existing file, or replaces it,
//! 5. the result is written back.
//!
//! Groups are written one by one. If a group fails, the groups written
//! before it stay written.

use crate::catalog::{Catalog, TranslationEntry};
use crate::groups::{partition, strip_group_prefix};
use crate::key_tree::{arrange, flatten, Tree};
use crate::patterns::PatternSet;
use crate::placeholders::to_internal;
use crate::store::{TranslationStore, WriteOutcome};
use anyhow::Context;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Also import entries marked as fuzzy.
    pub fuzzy: bool,
    /// Only import keys matching one of these patterns. An empty set
    /// imports every key.
    pub only: PatternSet,
    /// Replace the existing group files instead of merging into them.
    pub replace: bool,
}

/// Raised once per locale when at least one key was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationsImported {
    pub locale: String,
    /// Keys written per group, relative to the group.
    pub groups: BTreeMap<String, Vec<String>>,
}

/// Receives [`TranslationsImported`] events.
pub trait ImportListener {
    fn translations_imported(&mut self, event: &TranslationsImported) -> anyhow::Result<()>;
}

/// An entry of the source locale whose translation differs from its
/// original text, including an empty translation. This usually means
/// the translation files have drifted from the PO file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonMatching {
    pub key: String,
    pub original: String,
    pub translated: String,
}

#[derive(Debug)]
pub struct GroupImport {
    pub outcome: WriteOutcome,
    /// Keys written to the group, sorted.
    pub written: Vec<String>,
    pub non_matching: Vec<NonMatching>,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub locale: String,
    pub groups: BTreeMap<String, GroupImport>,
}

impl ImportReport {
    pub fn non_matching(&self) -> impl Iterator<Item = &NonMatching> {
        self.groups.values().flat_map(|group| &group.non_matching)
    }
}

pub struct Importer<'a> {
    store: &'a TranslationStore,
    source_locale: &'a str,
    options: &'a ImportOptions,
}

impl<'a> Importer<'a> {
    pub fn new(
        store: &'a TranslationStore,
        source_locale: &'a str,
        options: &'a ImportOptions,
    ) -> Self {
        Self {
            store,
            source_locale,
            options,
        }
    }

    /// Import every document whose locale is in `locales`.
    pub fn import_all(
        &self,
        documents: &BTreeMap<String, Catalog>,
        locales: &BTreeSet<String>,
        listener: &mut dyn ImportListener,
    ) -> anyhow::Result<Vec<ImportReport>> {
        documents
            .iter()
            .filter(|(locale, _)| locales.contains(*locale))
            .map(|(locale, catalog)| {
                self.import_document(locale, catalog, &mut *listener)
                    .with_context(|| format!("Could not import translations for {locale}"))
            })
            .collect()
    }

    /// Import one document into the files of `locale`.
    pub fn import_document(
        &self,
        locale: &str,
        catalog: &Catalog,
        listener: &mut dyn ImportListener,
    ) -> anyhow::Result<ImportReport> {
        let entries = catalog
            .entries
            .iter()
            .filter(|entry| self.options.fuzzy || !entry.fuzzy)
            .filter(|entry| self.options.only.admits(&entry.key))
            .cloned();

        let mut report = ImportReport {
            locale: String::from(locale),
            groups: BTreeMap::new(),
        };
        for (group, members) in partition(entries) {
            let result = self
                .import_group(locale, &group, &members)
                .with_context(|| format!("Could not import group {group:?}"))?;
            report.groups.insert(group, result);
        }

        let written = report
            .groups
            .iter()
            .filter(|(_, result)| !result.written.is_empty())
            .map(|(group, result)| (group.clone(), result.written.clone()))
            .collect::<BTreeMap<_, _>>();
        if !written.is_empty() {
            listener.translations_imported(&TranslationsImported {
                locale: String::from(locale),
                groups: written,
            })?;
        }
        Ok(report)
    }

    fn import_group(
        &self,
        locale: &str,
        group: &str,
        members: &[TranslationEntry],
    ) -> anyhow::Result<GroupImport> {
        let non_matching = if locale == self.source_locale {
            members
                .iter()
                .filter(|entry| entry.original != entry.translated)
                .map(|entry| NonMatching {
                    key: entry.key.clone(),
                    original: entry.original.clone(),
                    translated: entry.translated.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut incoming = Tree::new();
        for (key, entry) in strip_group_prefix(members, group) {
            if entry.is_translated() {
                let text = to_internal(&entry.translated).into_owned();
                incoming.insert(String::from(key), Value::String(text));
            }
        }
        let mut written = incoming.keys().cloned().collect::<Vec<_>>();
        written.sort();

        let merged = if self.options.replace {
            incoming
        } else {
            merge(&self.store.read(locale, group)?, incoming)
        };
        let data = arrange(&merged, self.store.structure())?;
        let outcome = self.store.write(locale, group, &data)?;

        Ok(GroupImport {
            outcome,
            written,
            non_matching,
        })
    }
}

/// Overlay `incoming` on the flattened `existing` data.
fn merge(existing: &Tree, incoming: Tree) -> Tree {
    let mut merged = flatten(existing);
    merged.extend(incoming);
    merged
}

/// Parse every `*.po` file in `import_dir`.
///
/// Documents are keyed by the `Language` header, or by the file name
/// when the header is empty. A missing directory has no documents.
pub fn discover_documents(import_dir: &Path) -> anyhow::Result<BTreeMap<String, Catalog>> {
    let mut documents = BTreeMap::new();
    if !import_dir.is_dir() {
        return Ok(documents);
    }
    for entry in fs::read_dir(import_dir)
        .with_context(|| format!("Could not list {}", import_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() || path.extension() != Some("po".as_ref()) {
            continue;
        }
        let catalog = Catalog::read(&path)?;
        let locale = match catalog.language.as_str() {
            "" => match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) => String::from(stem),
                None => continue,
            },
            language => String::from(language),
        };
        log::debug!("Found {} for {locale}", path.display());
        documents.insert(locale, catalog);
    }
    Ok(documents)
}
