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

//! Conversion between `:name` placeholders used in the translation
//! files and the `{name}` placeholders used in PO files.
//!
//! Neither direction understands escaping. Text such as `10:30` will
//! be rewritten to `10{30}` and back again.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

fn colon_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":(\w+)").expect("well-formed regex"))
}

fn brace_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("well-formed regex"))
}

/// Rewrite `:name` placeholders into `{name}` placeholders.
///
/// # Examples
///
/// ```
/// use po_sync::placeholders::to_external;
///
/// assert_eq!(
///     to_external("Hello :name, you have :count messages"),
///     "Hello {name}, you have {count} messages"
/// );
/// ```
pub fn to_external(text: &str) -> Cow<'_, str> {
    colon_placeholder().replace_all(text, "{$1}")
}

/// Rewrite `{name}` placeholders into `:name` placeholders.
///
/// Braces which do not wrap a single word are left alone.
///
/// # Examples
///
/// ```
/// use po_sync::placeholders::to_internal;
///
/// assert_eq!(to_internal("Bonjour {name}"), "Bonjour :name");
/// assert_eq!(to_internal("{ not a placeholder }"), "{ not a placeholder }");
/// ```
pub fn to_internal(text: &str) -> Cow<'_, str> {
    brace_placeholder().replace_all(text, ":$1")
}
