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

//! In-memory translation catalogs and their PO representation.
//!
//! Every entry is written as a PO message whose `msgctxt` is the dotted
//! key. The context keeps two keys with the same source text apart.

use crate::groups::Keyed;
use anyhow::Context;
use polib::catalog::Catalog as PoCatalog;
use polib::message::{Message, MessageFlags, MessageView};
use polib::metadata::CatalogMetadata;
use polib::po_file;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;

const FUZZY: &str = "fuzzy";

/// Header fields polib requires, with the values used when a file
/// leaves them out.
const HEADER_DEFAULTS: &[(&str, &str)] = &[
    ("Project-Id-Version", ""),
    ("POT-Creation-Date", ""),
    ("PO-Revision-Date", ""),
    ("Language-Team", ""),
    ("MIME-Version", "1.0"),
    ("Content-Type", "text/plain; charset=UTF-8"),
    ("Content-Transfer-Encoding", "8bit"),
    ("Language", ""),
    ("Plural-Forms", "nplurals=1; plural=0;"),
];

/// One translatable string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationEntry {
    /// Dotted key, e.g. `actions.save`.
    pub key: String,
    /// Text in the source locale.
    pub original: String,
    /// Text in the catalog's locale, empty when untranslated.
    pub translated: String,
    pub fuzzy: bool,
}

impl TranslationEntry {
    pub fn new(key: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            original: original.into(),
            translated: String::new(),
            fuzzy: false,
        }
    }

    pub fn is_translated(&self) -> bool {
        !self.translated.is_empty()
    }
}

impl Keyed for TranslationEntry {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Entries for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// The locale of the translated texts.
    pub language: String,
    pub entries: Vec<TranslationEntry>,
}

/// Values for the PO header which do not come from the catalog itself.
#[derive(Debug, Clone, Default)]
pub struct Header {
    pub project: Option<String>,
}

impl Catalog {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            entries: Vec::new(),
        }
    }

    /// Convert to a polib catalog ready to be written.
    pub fn to_po(&self, header: &Header) -> PoCatalog {
        let mut metadata = CatalogMetadata::new();
        if let Some(project) = &header.project {
            metadata.project_id_version = project.clone();
        }
        metadata.language = self.language.clone();
        let now = chrono::Local::now();
        metadata.pot_creation_date = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        metadata.mime_version = String::from("1.0");
        metadata.content_type = String::from("text/plain; charset=UTF-8");
        metadata.content_transfer_encoding = String::from("8bit");

        let mut catalog = PoCatalog::new(metadata);
        for entry in &self.entries {
            let mut flags = MessageFlags::new();
            if entry.fuzzy {
                flags.add_flag(FUZZY);
            }
            let message = Message::build_singular()
                .with_msgctxt(entry.key.clone())
                .with_msgid(entry.original.clone())
                .with_msgstr(entry.translated.clone())
                .with_flags(flags)
                .done();
            catalog.append_or_update(message);
        }
        catalog
    }

    /// Convert from a parsed polib catalog.
    ///
    /// Messages without a context use their `msgid` as key. Plural
    /// messages have no counterpart in the translation files and are
    /// skipped.
    pub fn from_po(catalog: &PoCatalog) -> Self {
        let entries = catalog
            .messages()
            .filter_map(|message| {
                let Ok(msgstr) = message.msgstr() else {
                    log::debug!("Skipping plural message {:?}", message.msgid());
                    return None;
                };
                let key = match message.msgctxt() {
                    "" => message.msgid(),
                    context => context,
                };
                Some(TranslationEntry {
                    key: String::from(key),
                    original: String::from(message.msgid()),
                    translated: String::from(msgstr),
                    fuzzy: message.is_fuzzy(),
                })
            })
            .collect();
        Self {
            language: catalog.metadata.language.clone(),
            entries,
        }
    }

    /// Parse the PO file at `path`.
    ///
    /// Downloaded and hand-written files often carry only some of the
    /// header fields. The missing ones get default values.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let catalog = parse_po(path, &content)
            .with_context(|| format!("Could not parse {} as PO file", path.display()))?;
        Ok(Self::from_po(&catalog))
    }

    /// Write the catalog as a PO file to `path`.
    pub fn write(&self, path: &Path, header: &Header) -> anyhow::Result<()> {
        po_file::write(&self.to_po(header), path)
            .with_context(|| format!("Could not write {}", path.display()))?;
        Ok(())
    }
}

/// Parse `content`, read from `path`, with polib.
fn parse_po(path: &Path, content: &str) -> anyhow::Result<PoCatalog> {
    check_strings(content)?;
    let parsed = match complete_header(content) {
        None => po_file::parse(path),
        Some(completed) => {
            let mut file = tempfile::Builder::new().suffix(".po").tempfile()?;
            file.write_all(completed.as_bytes())?;
            file.flush()?;
            po_file::parse(file.path())
        }
    };
    parsed.map_err(|err| anyhow::anyhow!("{err}"))
}

/// The text between the quotes of a PO string.
fn quoted(value: &str) -> Option<&str> {
    value.strip_prefix('"')?.strip_suffix('"')
}

/// Every string line must be enclosed in quotes.
fn check_strings(content: &str) -> anyhow::Result<()> {
    for (idx, line) in content.lines().enumerate() {
        let value = if line.starts_with('"') {
            Some(line)
        } else if line.starts_with("msg") {
            line.split_once(' ').map(|(_, value)| value)
        } else {
            None
        };
        if value.is_some_and(|value| quoted(value).is_none()) {
            anyhow::bail!("Line {}: expected a quoted string", idx + 1);
        }
    }
    Ok(())
}

/// Add the header fields which `content` lacks.
///
/// Returns `None` when nothing changes. That includes files without a
/// header, which polib rejects.
fn complete_header(content: &str) -> Option<String> {
    let lines = content.lines().collect::<Vec<_>>();
    let msgid = lines.iter().position(|line| line.starts_with("msgid "))?;
    if lines[msgid] != "msgid \"\"" || !lines.get(msgid + 1)?.starts_with("msgstr ") {
        return None;
    }
    let end = msgid
        + 2
        + lines[msgid + 2..]
            .iter()
            .take_while(|line| line.starts_with('"'))
            .count();
    let header = lines[msgid + 1..end]
        .iter()
        .filter_map(|line| quoted(line.strip_prefix("msgstr ").unwrap_or(line)))
        .collect::<String>();
    let present = header
        .split("\\n")
        .filter_map(|field| field.split_once(':'))
        .map(|(key, _)| key)
        .collect::<BTreeSet<_>>();

    let mut missing = HEADER_DEFAULTS
        .iter()
        .filter(|(key, _)| !present.contains(key))
        .map(|(key, value)| format!("\"{key}: {value}\\n\""))
        .peekable();
    missing.peek()?;
    // The last field must be terminated before more are appended.
    let separator = (!header.is_empty() && !header.ends_with("\\n"))
        .then(|| String::from("\"\\n\""));

    let mut completed = lines[..end]
        .iter()
        .map(|line| String::from(*line))
        .chain(separator)
        .chain(missing)
        .chain(lines[end..].iter().map(|line| String::from(*line)))
        .collect::<Vec<_>>()
        .join("\n");
    completed.push('\n');
    Some(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Catalog {
        let mut catalog = Catalog::new("fr");
        catalog.entries.push(TranslationEntry {
            translated: String::from("Enregistrer"),
            ..TranslationEntry::new("actions.save", "Save")
        });
        catalog.entries.push(TranslationEntry {
            translated: String::from("Bonjour {name}"),
            fuzzy: true,
            ..TranslationEntry::new("messages.hello", "Hello {name}")
        });
        catalog
            .entries
            .push(TranslationEntry::new("messages.bye", "Goodbye"));
        catalog
    }

    #[test]
    fn test_to_po_metadata() {
        let header = Header {
            project: Some(String::from("My App")),
        };
        let catalog = sample().to_po(&header);
        assert_eq!(catalog.metadata.project_id_version, "My App");
        assert_eq!(catalog.metadata.language, "fr");
        assert!(!catalog.metadata.pot_creation_date.is_empty());
        assert_eq!(catalog.metadata.mime_version, "1.0");
        assert_eq!(catalog.metadata.content_type, "text/plain; charset=UTF-8");
        assert_eq!(catalog.metadata.content_transfer_encoding, "8bit");
    }

    #[test]
    fn test_to_po_messages() {
        let catalog = sample().to_po(&Header::default());
        let messages = catalog
            .messages()
            .map(|msg| {
                (
                    msg.msgctxt(),
                    msg.msgid(),
                    msg.msgstr().unwrap(),
                    msg.is_fuzzy(),
                )
            })
            .collect::<Vec<_>>();
        assert_eq!(
            messages,
            [
                ("actions.save", "Save", "Enregistrer", false),
                ("messages.hello", "Hello {name}", "Bonjour {name}", true),
                ("messages.bye", "Goodbye", "", false),
            ]
        );
    }

    #[test]
    fn test_same_source_text_different_keys() {
        let mut catalog = Catalog::new("en");
        catalog.entries.push(TranslationEntry::new("actions.save", "Save"));
        catalog.entries.push(TranslationEntry::new("forms.save", "Save"));
        assert_eq!(catalog.to_po(&Header::default()).count(), 2);
    }

    #[test]
    fn test_write_then_read() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("fr.po");
        sample().write(&path, &Header::default())?;

        let content = std::fs::read_to_string(&path)?;
        assert!(content.contains("msgctxt \"actions.save\""));
        assert!(content.contains("#, fuzzy"));

        assert_eq!(Catalog::read(&path)?, sample());
        Ok(())
    }

    #[test]
    fn test_read_without_context() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("de.po");
        std::fs::write(
            &path,
            "msgid \"\"\n\
             msgstr \"\"\n\
             \"Language: de\\n\"\n\
             \n\
             msgid \"actions.save\"\n\
             msgstr \"Speichern\"\n",
        )?;

        let catalog = Catalog::read(&path)?;
        assert_eq!(catalog.language, "de");
        assert_eq!(
            catalog.entries,
            [TranslationEntry {
                translated: String::from("Speichern"),
                ..TranslationEntry::new("actions.save", "actions.save")
            }]
        );
        Ok(())
    }

    #[test]
    fn test_read_empty_header() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("fr.po");
        std::fs::write(
            &path,
            "msgid \"\"\n\
             msgstr \"\"\n\
             \n\
             msgctxt \"actions.save\"\n\
             msgid \"Save\"\n\
             msgstr \"Enregistrer\"\n",
        )?;

        let catalog = Catalog::read(&path)?;
        assert_eq!(catalog.language, "");
        assert_eq!(catalog.entries.len(), 1);
        assert_eq!(catalog.entries[0].key, "actions.save");
        Ok(())
    }

    #[test]
    fn test_complete_header_keeps_existing_fields() {
        let content = "msgid \"\"\n\
                       msgstr \"\"\n\
                       \"Plural-Forms: nplurals=2; plural=(n != 1);\\n\"\n\
                       \"Language: de\"\n";
        let completed = complete_header(content).unwrap();
        assert!(!completed.contains("nplurals=1"));
        assert!(completed.contains("\"Language: de\"\n\"\\n\"\n\"Project-Id-Version: \\n\"\n"));
        assert!(completed.contains("\"MIME-Version: 1.0\\n\""));
        assert!(completed.ends_with("\"Content-Transfer-Encoding: 8bit\\n\"\n"));
    }

    #[test]
    fn test_complete_header_unchanged() {
        let catalog = sample();
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("fr.po");
        catalog.write(&path, &Header::default()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(complete_header(&content), None);
    }

    #[test]
    fn test_read_unquoted_string() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("fr.po");
        std::fs::write(
            &path,
            "msgid \"\"\n\
             msgstr \"\"\n\
             \"Language: fr\\n\"\n\
             \n\
             msgid \"Save\n\
             msgstr \"\n",
        )?;

        let err = Catalog::read(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Line 5: expected a quoted string"));
        Ok(())
    }

    #[test]
    fn test_read_missing_file() {
        assert!(Catalog::read(Path::new("/does/not/exist.po")).is_err());
    }
}
