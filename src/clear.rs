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

//! Emptying an output directory, after confirmation.

use anyhow::Context;
use std::fs;
use std::path::Path;

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> anyhow::Result<bool>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    AlreadyEmpty,
    /// This many files were deleted.
    Cleared(usize),
    /// The user declined.
    Cancelled,
}

/// Delete the regular files directly inside `path`.
///
/// Unless `force` is set, `confirm` is asked first. Subdirectories are
/// left alone.
pub fn clear_directory(
    path: &Path,
    kind: &str,
    force: bool,
    confirm: &mut dyn Confirm,
) -> anyhow::Result<ClearOutcome> {
    let mut files = Vec::new();
    if path.is_dir() {
        for entry in
            fs::read_dir(path).with_context(|| format!("Could not list {}", path.display()))?
        {
            let file = entry?.path();
            if file.is_file() {
                files.push(file);
            }
        }
    }
    if files.is_empty() {
        log::info!("The {kind} directory is already empty.");
        return Ok(ClearOutcome::AlreadyEmpty);
    }
    files.sort();

    let names = files
        .iter()
        .filter_map(|file| file.file_name())
        .map(|name| name.to_string_lossy())
        .collect::<Vec<_>>();
    log::warn!(
        "The following files will be deleted from {}: {}",
        path.display(),
        names.join(", ")
    );

    if !force && !confirm.confirm("Do you want to continue?")? {
        return Ok(ClearOutcome::Cancelled);
    }

    for file in &files {
        fs::remove_file(file).with_context(|| format!("Could not delete {}", file.display()))?;
    }
    log::info!("Cleared {kind} directory.");
    Ok(ClearOutcome::Cleared(files.len()))
}
