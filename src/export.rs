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

//! Generating PO files from the translation files.
//!
//! The strings of the source locale form a base [`Catalog`]. Every
//! target locale gets its own copy of it, filled in with the
//! translations found for that locale, and written to
//! `<export>/<locale>.po`.

use crate::catalog::{Catalog, Header, TranslationEntry};
use crate::key_tree::Tree;
use crate::patterns::PatternSet;
use crate::placeholders::to_external;
use crate::store::TranslationStore;
use anyhow::Context;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of translated texts for a single locale.
pub trait TranslationLookup {
    /// The translation of the dotted `key`, if there is one.
    fn lookup(&self, key: &str) -> Option<&str>;
}

/// A flat map as returned by [`TranslationStore::read_locale`].
impl TranslationLookup for Tree {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

/// Result of exporting one locale.
#[derive(Debug)]
pub enum LocaleExport {
    Written(PathBuf),
    Failed(anyhow::Error),
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub locales: Vec<(String, LocaleExport)>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.locales
            .iter()
            .all(|(_, export)| matches!(export, LocaleExport::Written(_)))
    }
}

pub struct Exporter<'a> {
    store: &'a TranslationStore,
    excluded: &'a PatternSet,
    header: Header,
}

impl<'a> Exporter<'a> {
    pub fn new(store: &'a TranslationStore, excluded: &'a PatternSet, header: Header) -> Self {
        Self {
            store,
            excluded,
            header,
        }
    }

    /// Collect the translatable strings of `source_locale`.
    ///
    /// Keys matching an excluded pattern are skipped, as are values
    /// which are not non-empty strings.
    pub fn build_catalog(&self, source_locale: &str) -> anyhow::Result<Catalog> {
        let mut catalog = Catalog::new(source_locale);
        for (key, value) in self.store.read_locale(source_locale)? {
            if self.excluded.matches_any(&key) {
                continue;
            }
            let Some(original) = value.as_str().filter(|text| !text.is_empty()) else {
                continue;
            };
            catalog
                .entries
                .push(TranslationEntry::new(key, to_external(original)));
        }
        log::debug!(
            "Collected {} strings for {source_locale}",
            catalog.entries.len()
        );
        Ok(catalog)
    }

    /// Export `base` for every locale in `locales` into `export_dir`.
    ///
    /// A failure for one locale does not stop the others.
    pub fn export(
        &self,
        base: &Catalog,
        locales: &BTreeSet<String>,
        export_dir: &Path,
    ) -> anyhow::Result<ExportReport> {
        fs::create_dir_all(export_dir)
            .with_context(|| format!("Could not create {}", export_dir.display()))?;

        let mut report = ExportReport::default();
        for locale in locales {
            let export = match self.export_locale(base, locale, export_dir) {
                Ok(path) => LocaleExport::Written(path),
                Err(err) => LocaleExport::Failed(err),
            };
            report.locales.push((locale.clone(), export));
        }
        Ok(report)
    }

    fn export_locale(
        &self,
        base: &Catalog,
        locale: &str,
        export_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        let translations = self.store.read_locale(locale)?;
        let catalog = materialize_for_locale(base, locale, &translations);
        let path = export_dir.join(format!("{locale}.po"));
        catalog.write(&path, &self.header)?;
        Ok(path)
    }
}

/// Copy `base` and fill in the translations for `locale`.
///
/// Entries without a translation keep an empty translated text.
pub fn materialize_for_locale(
    base: &Catalog,
    locale: &str,
    lookup: &dyn TranslationLookup,
) -> Catalog {
    let mut catalog = base.clone();
    catalog.language = String::from(locale);
    for entry in &mut catalog.entries {
        if let Some(translated) = lookup.lookup(&entry.key) {
            entry.translated = to_external(translated).into_owned();
        }
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_tree::Structure;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tree(value: Value) -> Tree {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object, got {value}"),
        }
    }

    fn store_with(dir: &Path, files: &[(&str, &str, Value)]) -> anyhow::Result<TranslationStore> {
        let store = TranslationStore::new(dir, Structure::Nested);
        for (locale, group, data) in files {
            store.write(locale, group, &tree(data.clone()))?;
        }
        Ok(store)
    }

    fn keys(catalog: &Catalog) -> Vec<&str> {
        catalog.entries.iter().map(|entry| entry.key.as_str()).collect()
    }

    #[test]
    fn test_build_catalog() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let store = store_with(
            tmpdir.path(),
            &[("en", "actions", json!({"save": "Save"}))],
        )?;
        let excluded = PatternSet::default();
        let exporter = Exporter::new(&store, &excluded, Header::default());

        let catalog = exporter.build_catalog("en")?;
        assert_eq!(catalog.language, "en");
        assert_eq!(catalog.entries, [TranslationEntry::new("actions.save", "Save")]);
        Ok(())
    }

    #[test]
    fn test_build_catalog_converts_placeholders() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let store = store_with(
            tmpdir.path(),
            &[(
                "en",
                "messages",
                json!({"inbox": "Hello :name, you have :count messages"}),
            )],
        )?;
        let excluded = PatternSet::default();
        let exporter = Exporter::new(&store, &excluded, Header::default());

        let catalog = exporter.build_catalog("en")?;
        assert_eq!(
            catalog.entries[0].original,
            "Hello {name}, you have {count} messages"
        );
        Ok(())
    }

    #[test]
    fn test_build_catalog_excludes_groups() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let store = store_with(
            tmpdir.path(),
            &[
                ("en", "auth", json!({"failed": "These credentials are wrong."})),
                ("en", "actions", json!({"save": "Save"})),
            ],
        )?;
        let excluded = PatternSet::new(&["auth"])?;
        let exporter = Exporter::new(&store, &excluded, Header::default());

        assert_eq!(keys(&exporter.build_catalog("en")?), ["actions.save"]);
        Ok(())
    }

    #[test]
    fn test_build_catalog_skips_empty_and_non_strings() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let store = store_with(
            tmpdir.path(),
            &[(
                "en",
                "misc",
                json!({"empty": "", "null": null, "count": 3, "nested": {"ok": "Ok"}}),
            )],
        )?;
        let excluded = PatternSet::default();
        let exporter = Exporter::new(&store, &excluded, Header::default());

        assert_eq!(keys(&exporter.build_catalog("en")?), ["misc.nested.ok"]);
        Ok(())
    }

    #[test]
    fn test_materialize_for_locale() {
        let mut base = Catalog::new("en");
        base.entries.push(TranslationEntry::new("actions.save", "Save"));
        base.entries
            .push(TranslationEntry::new("messages.hello", "Hello {name}"));
        let translations = tree(json!({"messages.hello": "Bonjour :name"}));

        let catalog = materialize_for_locale(&base, "fr", &translations);
        assert_eq!(catalog.language, "fr");
        assert_eq!(catalog.entries[0].translated, "");
        assert_eq!(catalog.entries[1].translated, "Bonjour {name}");
        // The base catalog is left alone.
        assert_eq!(base.language, "en");
        assert!(base.entries.iter().all(|entry| !entry.is_translated()));
    }

    #[test]
    fn test_export_writes_one_file_per_locale() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let store = store_with(
            &tmpdir.path().join("lang"),
            &[
                ("en", "actions", json!({"save": "Save", "delete": "Delete"})),
                ("fr", "actions", json!({"save": "Enregistrer"})),
            ],
        )?;
        let excluded = PatternSet::default();
        let exporter = Exporter::new(&store, &excluded, Header::default());
        let base = exporter.build_catalog("en")?;
        let export_dir = tmpdir.path().join("export");
        let locales = BTreeSet::from([String::from("en"), String::from("fr")]);

        let report = exporter.export(&base, &locales, &export_dir)?;
        assert!(report.is_success());

        let fr = Catalog::read(&export_dir.join("fr.po"))?;
        assert_eq!(fr.language, "fr");
        let translated = fr
            .entries
            .iter()
            .map(|entry| (entry.key.as_str(), entry.translated.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            translated,
            [("actions.delete", ""), ("actions.save", "Enregistrer")]
        );

        let en = Catalog::read(&export_dir.join("en.po"))?;
        assert!(en
            .entries
            .iter()
            .all(|entry| entry.original == entry.translated));
        Ok(())
    }

    #[test]
    fn test_export_failure_is_per_locale() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let store = store_with(
            tmpdir.path(),
            &[("en", "actions", json!({"save": "Save"}))],
        )?;
        fs::create_dir_all(tmpdir.path().join("de"))?;
        fs::write(tmpdir.path().join("de/actions.json"), "not json")?;
        let excluded = PatternSet::default();
        let exporter = Exporter::new(&store, &excluded, Header::default());
        let base = exporter.build_catalog("en")?;
        let export_dir = tmpdir.path().join("export");
        let locales = BTreeSet::from([String::from("de"), String::from("en")]);

        let report = exporter.export(&base, &locales, &export_dir)?;
        assert!(!report.is_success());
        assert!(matches!(report.locales[0], (_, LocaleExport::Failed(_))));
        assert!(matches!(report.locales[1], (_, LocaleExport::Written(_))));
        assert!(export_dir.join("en.po").exists());
        assert!(!export_dir.join("de.po").exists());
        Ok(())
    }
}
