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

//! Deciding which locales a command works on.
//!
//! Every command starts from a pool of candidate locales: the enabled
//! entries of the `languages` table, or every locale directory when
//! the table is empty. Locale arguments and the `--all` flag then
//! select from that pool, with a per-command fallback when neither is
//! given.

use crate::config::LanguageConfig;
use std::collections::{BTreeMap, BTreeSet};

/// How locale arguments relate to the pool.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExplicitArgs {
    /// Only arguments which are also in the pool are used.
    Intersect,
    /// Arguments are used as given.
    Direct,
}

/// What to select when there are no locale arguments and no `--all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// A single locale, if it is in the pool.
    Locale(String),
    /// The entire pool.
    Pool,
    /// Nothing at all.
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub explicit: ExplicitArgs,
    pub fallback: Fallback,
}

impl Policy {
    /// Exporting defaults to the source locale.
    pub fn export(source_locale: &str) -> Self {
        Policy {
            explicit: ExplicitArgs::Intersect,
            fallback: Fallback::Locale(String::from(source_locale)),
        }
    }

    /// Importing defaults to every enabled locale.
    pub fn import() -> Self {
        Policy {
            explicit: ExplicitArgs::Intersect,
            fallback: Fallback::Pool,
        }
    }

    /// Sorting trusts its arguments, even for disabled locales.
    pub fn sort() -> Self {
        Policy {
            explicit: ExplicitArgs::Direct,
            fallback: Fallback::Pool,
        }
    }

    /// Downloading needs either arguments or `--all`.
    pub fn download() -> Self {
        Policy {
            explicit: ExplicitArgs::Intersect,
            fallback: Fallback::Nothing,
        }
    }
}

/// The enabled configured locales, or the detected ones when nothing
/// is configured.
pub fn candidate_pool<F>(
    configured: &BTreeMap<String, LanguageConfig>,
    auto_detect: F,
) -> anyhow::Result<BTreeSet<String>>
where
    F: FnOnce() -> anyhow::Result<BTreeSet<String>>,
{
    if configured.is_empty() {
        return auto_detect();
    }
    Ok(configured
        .iter()
        .filter(|(_, language)| language.enabled)
        .map(|(locale, _)| locale.clone())
        .collect())
}

/// Compute the locales to work on.
///
/// An empty result is not an error; callers should warn and do
/// nothing.
pub fn resolve<F>(
    explicit: &[String],
    all: bool,
    policy: &Policy,
    configured: &BTreeMap<String, LanguageConfig>,
    auto_detect: F,
) -> anyhow::Result<BTreeSet<String>>
where
    F: FnOnce() -> anyhow::Result<BTreeSet<String>>,
{
    if !explicit.is_empty() && policy.explicit == ExplicitArgs::Direct {
        return Ok(explicit.iter().cloned().collect());
    }

    let pool = candidate_pool(configured, auto_detect)?;
    if !explicit.is_empty() {
        return Ok(explicit
            .iter()
            .filter(|locale| pool.contains(*locale))
            .cloned()
            .collect());
    }
    if all {
        return Ok(pool);
    }
    Ok(match &policy.fallback {
        Fallback::Locale(locale) if pool.contains(locale) => BTreeSet::from([locale.clone()]),
        Fallback::Locale(_) | Fallback::Nothing => BTreeSet::new(),
        Fallback::Pool => pool,
    })
}

/// English names of common languages, keyed by lowercase tag.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("bn", "Bengali"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("en-gb", "English (United Kingdom)"),
    ("en-us", "English (United States)"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("lt", "Lithuanian"),
    ("lv", "Latvian"),
    ("nb", "Norwegian Bokmål"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("pt-br", "Portuguese (Brazil)"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sr", "Serbian"),
    ("sv", "Swedish"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
    ("zh-cn", "Chinese (China)"),
    ("zh-tw", "Chinese (Taiwan)"),
];

/// Look up the English name of `locale`.
///
/// Both `pt-BR` and `pt_BR` are accepted. A region we do not know
/// falls back to the name of the language itself.
pub fn language_name(locale: &str) -> Option<&'static str> {
    let tag = locale.replace('_', "-").to_ascii_lowercase();
    let find = |tag: &str| {
        LANGUAGE_NAMES
            .binary_search_by_key(&tag, |(code, _)| *code)
            .ok()
            .map(|idx| LANGUAGE_NAMES[idx].1)
    };
    find(&tag).or_else(|| find(tag.split('-').next()?))
}

/// Format `locale` for messages, e.g. `French [fr]`.
///
/// Unknown locales use the configured label, or just the identifier.
pub fn describe(locale: &str, configured: &BTreeMap<String, LanguageConfig>) -> String {
    let label = language_name(locale).or_else(|| {
        configured
            .get(locale)
            .and_then(|language| language.label.as_deref())
    });
    match label {
        Some(label) => format!("{label} [{locale}]"),
        None => String::from(locale),
    }
}
