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

//! Synchronize key-value translation files with Gettext PO files.
//!
//! Translations are stored per locale and per group in
//! `<lang>/<locale>/<group>.json`, with dotted keys such as
//! `actions.save`. The functions here turn the strings of the source
//! locale into one PO file per target locale, and load translated PO
//! files back into the translation files. PO files can optionally be
//! downloaded from POEditor first.
//!
//! The workflow is:
//!
//! 1. Export with [`export::Exporter`].
//! 2. Have the PO files translated.
//! 3. Import them with [`import::Importer`].
//!
//! The `po-sync` binary wraps all of this in a command line tool
//! configured by `po-sync.toml`, see [`config::Config`].

pub mod catalog;
pub mod clear;
pub mod config;
pub mod export;
pub mod groups;
pub mod import;
pub mod key_tree;
pub mod locales;
pub mod patterns;
pub mod placeholders;
pub mod remote;
pub mod sort;
pub mod store;
