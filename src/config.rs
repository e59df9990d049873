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

//! Configuration read from `po-sync.toml`.
//!
//! ## Example
//!
//! ```toml
//! source_locale = "en"
//! structure = "nested"
//! excluded_groups = ["auth", "validation"]
//!
//! [paths]
//! lang = "lang"
//! export = "lang/export"
//! import = "lang/import"
//!
//! [languages.en]
//! label = "English"
//!
//! [languages.de]
//! label = "Deutsch"
//! enabled = false
//!
//! [poeditor]
//! enabled = true
//! project_id = "12345"
//! ```
//!
//! The POEditor credentials can also come from the `POEDITOR_ENABLED`,
//! `POEDITOR_API_TOKEN` and `POEDITOR_PROJECT_ID` environment variables.

use crate::key_tree::Structure;
use crate::patterns::{PatternError, PatternSet};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "po-sync.toml";

pub const DEFAULT_API_URL: &str = "https://api.poeditor.com/v2";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Locale holding the source-of-truth strings.
    pub source_locale: String,
    /// Written to the `Project-Id-Version` header of exported files.
    pub project: Option<String>,
    pub structure: Structure,
    /// Key prefixes left out of exported PO files.
    pub excluded_groups: Vec<String>,
    pub paths: Paths,
    /// Known languages. When empty, every directory in the lang root
    /// is treated as an enabled locale.
    pub languages: BTreeMap<String, LanguageConfig>,
    pub poeditor: PoEditorConfig,
    pub hooks: Hooks,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Paths {
    pub lang: PathBuf,
    pub export: PathBuf,
    pub import: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LanguageConfig {
    pub label: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PoEditorConfig {
    pub enabled: bool,
    pub api_token: Option<String>,
    pub project_id: Option<String>,
    pub api_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Hooks {
    /// Program and arguments run after each imported locale.
    pub after_import: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_locale: String::from("en"),
            project: None,
            structure: Structure::default(),
            excluded_groups: ["auth", "pagination", "passwords", "validation"]
                .map(String::from)
                .to_vec(),
            paths: Paths::default(),
            languages: BTreeMap::new(),
            poeditor: PoEditorConfig::default(),
            hooks: Hooks::default(),
        }
    }
}

impl Default for Paths {
    fn default() -> Self {
        let lang = PathBuf::from("lang");
        Self {
            export: lang.join("export"),
            import: lang.join("import"),
            lang,
        }
    }
}

impl Default for PoEditorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_token: None,
            project_id: None,
            api_url: String::from(DEFAULT_API_URL),
        }
    }
}

impl LanguageConfig {
    pub fn new(label: &str, enabled: bool) -> Self {
        Self {
            label: Some(String::from(label)),
            enabled,
        }
    }
}

impl Config {
    /// Load the configuration from `path`.
    ///
    /// A missing file gives the default configuration.
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() {
            log::debug!("No {} found, using defaults", path.display());
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Could not parse {}", path.display()))?;
        Ok(config)
    }

    /// Override the POEditor settings from environment variables.
    ///
    /// The variables are looked up with `var`, which is normally
    /// `|name| std::env::var(name).ok()`.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(enabled) = var("POEDITOR_ENABLED") {
            self.poeditor.enabled = matches!(
                enabled.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(token) = var("POEDITOR_API_TOKEN").filter(|token| !token.is_empty()) {
            self.poeditor.api_token = Some(token);
        }
        if let Some(id) = var("POEDITOR_PROJECT_ID").filter(|id| !id.is_empty()) {
            self.poeditor.project_id = Some(id);
        }
    }

    /// Check the configuration for errors which would only show up
    /// halfway through a command.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.excluded_patterns()
            .context("Invalid pattern in 'excluded_groups'")?;
        if self.source_locale.is_empty() {
            anyhow::bail!("'source_locale' must not be empty");
        }
        Ok(())
    }

    pub fn excluded_patterns(&self) -> Result<PatternSet, PatternError> {
        PatternSet::new(&self.excluded_groups)
    }
}
