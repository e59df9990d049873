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

//! Glob-style prefix patterns for dotted keys.
//!
//! A pattern matches every key which starts with it, and `*` matches
//! any run of characters, dots included. The pattern `auth` therefore
//! matches `auth.failed` but also `authors.title`. Every other character,
//! `?` and brackets included, only matches itself.

use glob::Pattern;

#[derive(Debug, thiserror::Error)]
#[error("invalid key pattern {pattern:?}")]
pub struct PatternError {
    pattern: String,
    #[source]
    source: glob::PatternError,
}

/// A single prefix pattern.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    source: String,
    glob: Pattern,
}

impl KeyPattern {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let mut prefix = String::new();
        for (idx, literal) in pattern.split('*').enumerate() {
            // `glob` rejects `**` inside a path component, so runs of
            // wildcards collapse into one.
            if idx > 0 && !prefix.ends_with('*') {
                prefix.push('*');
            }
            prefix.push_str(&Pattern::escape(literal));
        }
        if !prefix.ends_with('*') {
            prefix.push('*');
        }
        let glob = Pattern::new(&prefix).map_err(|source| PatternError {
            pattern: String::from(pattern),
            source,
        })?;
        Ok(KeyPattern {
            source: String::from(pattern),
            glob,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, key: &str) -> bool {
        self.glob.matches(key)
    }
}

/// A list of patterns; a key matches the set when any pattern matches.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<KeyPattern>,
}

impl PatternSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        let patterns = patterns
            .iter()
            .map(|pattern| KeyPattern::new(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PatternSet { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyPattern> {
        self.patterns.iter()
    }

    /// Does any pattern match `key`?
    pub fn matches_any(&self, key: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(key))
    }

    /// Like [`PatternSet::matches_any`], but an empty set admits every key.
    pub fn admits(&self, key: &str) -> bool {
        self.is_empty() || self.matches_any(key)
    }
}
