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

//! Rewriting translation files in sorted order.

use crate::store::TranslationStore;
use anyhow::Context;

/// Rewrite every group of `locale` sorted by key.
///
/// Returns the names of the groups which were rewritten. Empty groups
/// are left as they are.
pub fn sort_locale(store: &TranslationStore, locale: &str) -> anyhow::Result<Vec<String>> {
    let mut sorted = Vec::new();
    for group in store.list_groups(locale)? {
        let data = store.read(locale, &group)?;
        if data.is_empty() {
            continue;
        }
        store
            .write(locale, &group, &data)
            .with_context(|| format!("Could not sort {locale}/{group}"))?;
        sorted.push(group);
    }
    Ok(sorted)
}
