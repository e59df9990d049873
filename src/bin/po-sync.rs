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

//! `po-sync`: export translation files to PO files and import them
//! again.
//!
//! ```sh
//! $ po-sync export --all
//! $ po-sync download fr de
//! $ po-sync import
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use po_sync::catalog::Header;
use po_sync::clear::{clear_directory, ClearOutcome, Confirm};
use po_sync::config::{Config, CONFIG_FILE_NAME};
use po_sync::export::{Exporter, LocaleExport};
use po_sync::import::{
    discover_documents, ImportListener, ImportOptions, Importer, NonMatching, TranslationsImported,
};
use po_sync::locales::{describe, resolve, Policy};
use po_sync::patterns::PatternSet;
use po_sync::remote::{download, PoEditorClient, RemoteApi};
use po_sync::sort::sort_locale;
use po_sync::store::TranslationStore;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::{self, ExitCode};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true, env = "PO_SYNC_CONFIG", default_value = CONFIG_FILE_NAME)]
    config: PathBuf,
    /// Directory with the translation files, overrides `paths.lang`.
    #[arg(long, global = true, value_name = "DIR")]
    lang_dir: Option<PathBuf>,
    /// Directory for exported PO files, overrides `paths.export`.
    #[arg(long, global = true, value_name = "DIR")]
    export_dir: Option<PathBuf>,
    /// Directory with PO files to import, overrides `paths.import`.
    #[arg(long, global = true, value_name = "DIR")]
    import_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate PO files for translation.
    Export {
        /// Locales to export. Defaults to the source locale.
        locales: Vec<String>,
        /// Export all enabled locales.
        #[arg(long)]
        all: bool,
        /// Clear the export directory first.
        #[arg(long)]
        clear: bool,
        /// Do not ask before clearing.
        #[arg(long)]
        force: bool,
    },
    /// Load translated PO files into the translation files.
    Import {
        /// Locales to import. Defaults to all enabled locales.
        locales: Vec<String>,
        /// Include fuzzy translations.
        #[arg(long)]
        fuzzy: bool,
        /// Only import keys starting with this pattern.
        #[arg(long, value_name = "PATTERN")]
        only: Vec<String>,
        /// Replace the translation files instead of merging.
        #[arg(long)]
        replace: bool,
    },
    /// Sort the keys of the translation files.
    Sort {
        /// Locales to sort. Defaults to all enabled locales.
        locales: Vec<String>,
    },
    /// Download PO files from POEditor into the import directory.
    Download {
        /// Locales to download.
        locales: Vec<String>,
        /// Download all enabled locales.
        #[arg(long)]
        all: bool,
    },
    /// List the languages of the POEditor project.
    Languages,
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"));
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    config.apply_env(|name| std::env::var(name).ok());
    if let Some(dir) = cli.lang_dir {
        config.paths.lang = dir;
    }
    if let Some(dir) = cli.export_dir {
        config.paths.export = dir;
    }
    if let Some(dir) = cli.import_dir {
        config.paths.import = dir;
    }
    config.validate()?;

    let success = match cli.command {
        Command::Export {
            locales,
            all,
            clear,
            force,
        } => export(&config, &locales, all, clear, force)?,
        Command::Import {
            locales,
            fuzzy,
            only,
            replace,
        } => {
            let options = ImportOptions {
                fuzzy,
                only: PatternSet::new(&only).context("Invalid --only pattern")?,
                replace,
            };
            import(&config, &locales, &options)?
        }
        Command::Sort { locales } => sort(&config, &locales)?,
        Command::Download { locales, all } => download_files(&config, &locales, all)?,
        Command::Languages => languages(&config)?,
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn store(config: &Config) -> TranslationStore {
    TranslationStore::new(&config.paths.lang, config.structure)
}

fn resolve_locales(
    config: &Config,
    store: &TranslationStore,
    explicit: &[String],
    all: bool,
    policy: &Policy,
) -> anyhow::Result<BTreeSet<String>> {
    resolve(explicit, all, policy, &config.languages, || {
        store.detect_locales(&[config.paths.export.as_path(), config.paths.import.as_path()])
    })
}

fn export(
    config: &Config,
    explicit: &[String],
    all: bool,
    clear: bool,
    force: bool,
) -> anyhow::Result<bool> {
    let store = store(config);
    let source = &config.source_locale;
    info!(
        "Generating translation files using the default language: {}",
        describe(source, &config.languages)
    );

    let excluded = config.excluded_patterns()?;
    let header = Header {
        project: config.project.clone(),
    };
    let exporter = Exporter::new(&store, &excluded, header);
    let base = exporter.build_catalog(source)?;

    let export_dir = &config.paths.export;
    std::fs::create_dir_all(export_dir)
        .with_context(|| format!("Could not create {}", export_dir.display()))?;
    if clear && clear_directory(export_dir, "export", force, &mut StdinConfirm)? == ClearOutcome::Cancelled
    {
        info!("Operation cancelled.");
        return Ok(false);
    }

    let locales = resolve_locales(config, &store, explicit, all, &Policy::export(source))?;
    if locales.is_empty() {
        warn!("No languages to export");
        return Ok(true);
    }

    let report = exporter.export(&base, &locales, export_dir)?;
    for (locale, export) in &report.locales {
        let language = describe(locale, &config.languages);
        match export {
            LocaleExport::Written(path) => {
                info!("Created PO file for {language}: {}", path.display())
            }
            LocaleExport::Failed(err) => error!("Could not create PO file for {language}: {err:#}"),
        }
    }
    Ok(report.is_success())
}

fn import(config: &Config, explicit: &[String], options: &ImportOptions) -> anyhow::Result<bool> {
    let store = store(config);
    let documents = discover_documents(&config.paths.import)?;
    let locales = resolve_locales(config, &store, explicit, false, &Policy::import())?;
    if !documents.keys().any(|locale| locales.contains(locale)) {
        warn!("No PO files to import in {}", config.paths.import.display());
        return Ok(true);
    }

    let importer = Importer::new(&store, &config.source_locale, options);
    let mut hook = ImportHook {
        command: &config.hooks.after_import,
    };
    let reports = importer.import_all(&documents, &locales, &mut hook)?;
    for report in &reports {
        info!(
            "Loaded translations for {}",
            describe(&report.locale, &config.languages)
        );
        for group in report.groups.keys() {
            info!("  {}", store.group_path(&report.locale, group).display());
        }
        let non_matching = report.non_matching().collect::<Vec<_>>();
        if !non_matching.is_empty() {
            warn!(
                "{} non-matching terms for default language",
                non_matching.len()
            );
            print_non_matching(&non_matching);
        }
    }
    Ok(true)
}

fn sort(config: &Config, explicit: &[String]) -> anyhow::Result<bool> {
    let store = store(config);
    let locales = resolve_locales(config, &store, explicit, false, &Policy::sort())?;
    if locales.is_empty() {
        warn!("No languages to sort");
        return Ok(false);
    }
    for locale in &locales {
        if store.list_groups(locale)?.is_empty() {
            warn!("No translation files found for {locale}");
            continue;
        }
        let groups = sort_locale(&store, locale)?;
        info!(
            "Sorted {} groups for {}",
            groups.len(),
            describe(locale, &config.languages)
        );
    }
    Ok(true)
}

fn download_files(config: &Config, explicit: &[String], all: bool) -> anyhow::Result<bool> {
    let client = PoEditorClient::from_config(&config.poeditor)?;
    let store = store(config);

    info!("Downloading translations from POEditor");
    let locales = resolve_locales(config, &store, explicit, all, &Policy::download())?;
    if locales.is_empty() {
        warn!("No languages to download. Use --all or give language codes.");
        return Ok(false);
    }

    let import_dir = &config.paths.import;
    let report = download(&client, &locales, import_dir)?;
    for (locale, result) in &report.locales {
        match result {
            Ok(path) => info!("Downloaded {}", path.display()),
            Err(err) => error!("Could not download {locale}.po: {err:#}"),
        }
    }
    if report.is_success() {
        info!(
            "All translations downloaded successfully to {}/",
            import_dir.display()
        );
        info!("Run `po-sync import` to import them.");
    }
    Ok(report.is_success())
}

#[allow(clippy::print_stdout)]
fn languages(config: &Config) -> anyhow::Result<bool> {
    let client = PoEditorClient::from_config(&config.poeditor)?;
    let languages = client.list_languages()?;
    if languages.is_empty() {
        warn!("The POEditor project has no languages");
        return Ok(true);
    }
    let width = languages
        .iter()
        .map(|language| language.code.len())
        .max()
        .unwrap_or_default();
    for language in &languages {
        println!(
            "{:width$}  {:>5.1}%  {}",
            language.code, language.percentage, language.name
        );
    }
    Ok(true)
}

#[allow(clippy::print_stdout)]
fn print_non_matching(terms: &[&NonMatching]) {
    let key_width = terms.iter().map(|term| term.key.len()).max().unwrap_or(0).max(3);
    let original_width = terms
        .iter()
        .map(|term| term.original.chars().count())
        .max()
        .unwrap_or(0)
        .max(8);
    println!("  {:key_width$}  {:original_width$}  Translation", "Key", "Original");
    for term in terms {
        println!(
            "  {:key_width$}  {:original_width$}  {}",
            term.key, term.original, term.translated
        );
    }
}

/// Asks on the terminal, defaulting to no.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    #[allow(clippy::print_stderr)]
    fn confirm(&mut self, question: &str) -> anyhow::Result<bool> {
        eprint!("{question} [y/N] ");
        io::stderr().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

/// Logs imports and runs the `after_import` hook.
struct ImportHook<'a> {
    command: &'a [String],
}

impl ImportListener for ImportHook<'_> {
    fn translations_imported(&mut self, event: &TranslationsImported) -> anyhow::Result<()> {
        let keys = event.groups.values().map(Vec::len).sum::<usize>();
        info!(
            "Imported {keys} keys into {} groups for {}",
            event.groups.len(),
            event.locale
        );

        let Some((program, args)) = self.command.split_first() else {
            return Ok(());
        };
        let groups = event.groups.keys().cloned().collect::<Vec<_>>().join(",");
        let status = process::Command::new(program)
            .args(args)
            .env("PO_SYNC_LOCALE", &event.locale)
            .env("PO_SYNC_GROUPS", groups)
            .status()
            .with_context(|| format!("Could not run hook {program:?}"))?;
        if !status.success() {
            anyhow::bail!("Hook {program:?} failed: {status}");
        }
        Ok(())
    }
}
