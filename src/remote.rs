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

//! Downloading translated PO files from POEditor.
//!
//! An export is requested per locale. POEditor answers with a
//! short-lived URL which is then fetched. The API reports errors in
//! the body with `response.status`, so a `200 OK` is not enough.

use crate::config::PoEditorConfig;
use anyhow::Context;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("POEditor integration is not enabled. Set POEDITOR_ENABLED=true.")]
    Disabled,
    #[error("POEditor API credentials not configured. Set POEDITOR_API_TOKEN and POEDITOR_PROJECT_ID.")]
    MissingCredentials,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("request failed with HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response from POEditor")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("POEditor API error: {message}")]
    Api { message: String },
    #[error("no download URL returned")]
    MissingUrl,
}

/// A language of the POEditor project.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteLanguage {
    pub code: String,
    pub name: String,
    /// Share of translated terms, from 0 to 100.
    #[serde(default)]
    pub percentage: f64,
}

/// The operations needed from a translation management service.
pub trait RemoteApi {
    /// Ask for a PO export of `locale` and return its download URL.
    fn request_export(&self, locale: &str) -> Result<String, RemoteError>;

    /// Fetch the document at `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, RemoteError>;

    fn list_languages(&self) -> Result<Vec<RemoteLanguage>, RemoteError>;
}

pub struct PoEditorClient {
    client: Client,
    api_url: String,
    api_token: String,
    project_id: String,
}

impl PoEditorClient {
    /// Create a client, checking that the integration is enabled and
    /// configured.
    pub fn from_config(config: &PoEditorConfig) -> Result<Self, RemoteError> {
        if !config.enabled {
            return Err(RemoteError::Disabled);
        }
        let (Some(api_token), Some(project_id)) =
            (non_empty(&config.api_token), non_empty(&config.project_id))
        else {
            return Err(RemoteError::MissingCredentials);
        };
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            api_url: String::from(config.api_url.trim_end_matches('/')),
            api_token: String::from(api_token),
            project_id: String::from(project_id),
        })
    }

    fn post(&self, endpoint: &str, form: &[(&str, &str)]) -> Result<Value, RemoteError> {
        let url = format!("{}/{endpoint}", self.api_url);
        log::debug!("POST {url}");
        let mut params = vec![("api_token", self.api_token.as_str()), ("id", self.project_id.as_str())];
        params.extend_from_slice(form);
        let response = self.client.post(&url).form(&params).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_response(&body)
    }
}

impl RemoteApi for PoEditorClient {
    fn request_export(&self, locale: &str) -> Result<String, RemoteError> {
        let result = self.post("projects/export", &[("language", locale), ("type", "po")])?;
        export_url(&result)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }

    fn list_languages(&self) -> Result<Vec<RemoteLanguage>, RemoteError> {
        let result = self.post("languages/list", &[])?;
        let languages = result.get("languages").cloned().unwrap_or(Value::Null);
        if languages.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(languages)?)
    }
}

/// Check the `response.status` of a POEditor reply and return its
/// `result`.
fn parse_response(body: &str) -> Result<Value, RemoteError> {
    let mut reply: Value = serde_json::from_str(body)?;
    let status = reply.pointer("/response/status").and_then(Value::as_str);
    if status != Some("success") {
        let message = reply
            .pointer("/response/message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error");
        return Err(RemoteError::Api {
            message: String::from(message),
        });
    }
    Ok(reply
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

fn export_url(result: &Value) -> Result<String, RemoteError> {
    result
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(String::from)
        .ok_or(RemoteError::MissingUrl)
}

#[derive(Debug, Default)]
pub struct DownloadReport {
    pub locales: Vec<(String, anyhow::Result<PathBuf>)>,
}

impl DownloadReport {
    /// True when every locale was downloaded.
    pub fn is_success(&self) -> bool {
        self.locales.iter().all(|(_, result)| result.is_ok())
    }
}

/// Download `<import_dir>/<locale>.po` for every locale.
///
/// A failed locale is recorded in the report and the next locale is
/// tried. Nothing is retried.
pub fn download(
    api: &dyn RemoteApi,
    locales: &BTreeSet<String>,
    import_dir: &Path,
) -> anyhow::Result<DownloadReport> {
    fs::create_dir_all(import_dir)
        .with_context(|| format!("Could not create {}", import_dir.display()))?;

    let mut report = DownloadReport::default();
    for locale in locales {
        let result = download_locale(api, locale, import_dir);
        if let Err(err) = &result {
            log::debug!("Download of {locale} failed: {err:#}");
        }
        report.locales.push((locale.clone(), result));
    }
    Ok(report)
}

fn download_locale(api: &dyn RemoteApi, locale: &str, import_dir: &Path) -> anyhow::Result<PathBuf> {
    let url = api
        .request_export(locale)
        .with_context(|| format!("Could not request export for {locale}"))?;
    let content = api
        .fetch(&url)
        .with_context(|| format!("Could not download file for {locale}"))?;
    let path = import_dir.join(format!("{locale}.po"));
    fs::write(&path, content).with_context(|| format!("Could not write {}", path.display()))?;
    Ok(path)
}
