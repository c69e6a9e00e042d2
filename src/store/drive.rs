//! Google Drive v3 store.
//!
//! Lists a folder with the `files.list` REST endpoint and downloads with
//! `files.get?alt=media`. Native Google Slides and Docs files have no binary
//! content of their own; they are exported as PPTX and DOCX instead, so the
//! extractor sees the same formats as for uploaded files.
//!
//! # Configuration
//!
//! ```toml
//! [store]
//! kind = "drive"
//!
//! [store.drive]
//! api_base = "https://www.googleapis.com/drive/v3"
//! token_env = "GOOGLE_DRIVE_ACCESS_TOKEN"
//! ```
//!
//! # Authentication
//!
//! Requests carry an OAuth 2.0 bearer token with at least the
//! `drive.readonly` scope. The store receives the token from its caller;
//! the `brief` CLI reads it from the variable named by `token_env`.
//!
//! # Pagination
//!
//! Large folders are followed through `nextPageToken` until exhausted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;

use crate::extract::{MIME_DOCX, MIME_PPTX};
use crate::models::{CandidateDocument, MaterialFolder};

use super::{DocumentStore, StoreError};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";

pub const MIME_GOOGLE_SLIDES: &str = "application/vnd.google-apps.presentation";
pub const MIME_GOOGLE_DOCS: &str = "application/vnd.google-apps.document";

const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,createdTime)";
const PAGE_SIZE: &str = "1000";
const ERROR_BODY_LIMIT: usize = 500;

pub struct DriveStore {
    api_base: Url,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: Option<String>,
    created_time: DateTime<Utc>,
}

impl From<DriveFile> for CandidateDocument {
    fn from(file: DriveFile) -> Self {
        CandidateDocument {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            created_time: file.created_time,
        }
    }
}

impl DriveStore {
    pub fn new(api_base: impl AsRef<str>, token: impl Into<String>) -> Result<Self> {
        let api_base = Url::parse(api_base.as_ref())
            .with_context(|| format!("Invalid Drive API base URL: {}", api_base.as_ref()))?;
        if api_base.cannot_be_a_base() {
            anyhow::bail!("Drive API base URL cannot carry a path: {}", api_base);
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("lecture-brief/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            api_base,
            token: token.into(),
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Quotes a value for a Drive `q` expression.
fn quote_query_value(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn list_query(folder: &MaterialFolder, mime_filter: Option<&str>) -> String {
    let mut q = format!(
        "{} in parents and trashed = false",
        quote_query_value(folder.id())
    );
    if let Some(mime) = mime_filter {
        q.push_str(&format!(" and mimeType = {}", quote_query_value(mime)));
    }
    q
}

/// Export format for native Google files, `None` for binary uploads.
fn export_format(mime_type: Option<&str>) -> Option<&'static str> {
    match mime_type? {
        MIME_GOOGLE_SLIDES => Some(MIME_PPTX),
        MIME_GOOGLE_DOCS => Some(MIME_DOCX),
        _ => None,
    }
}

async fn check_status(resp: reqwest::Response, what: &str) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(what.to_string()));
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body: body.chars().take(ERROR_BODY_LIMIT).collect(),
    })
}

#[async_trait]
impl DocumentStore for DriveStore {
    fn kind(&self) -> &str {
        "drive"
    }

    async fn list(
        &self,
        folder: &MaterialFolder,
        mime_filter: Option<&str>,
    ) -> Result<Vec<CandidateDocument>, StoreError> {
        let q = list_query(folder, mime_filter);
        let url = self.endpoint(&["files"]);
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self.client.get(url.clone()).bearer_auth(&self.token).query(&[
                ("q", q.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ]);
            if let Some(ref token) = page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }

            let resp = req
                .send()
                .await
                .map_err(|e| StoreError::Request(e.to_string()))?;
            let resp = check_status(resp, &format!("folder {}", folder)).await?;
            let page: FileList = resp
                .json()
                .await
                .map_err(|e| StoreError::Decode(e.to_string()))?;

            docs.extend(page.files.into_iter().map(CandidateDocument::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(docs)
    }

    async fn download(&self, doc: &CandidateDocument) -> Result<Vec<u8>, StoreError> {
        let req = match export_format(doc.mime_type.as_deref()) {
            Some(export_mime) => self
                .client
                .get(self.endpoint(&["files", doc.id.as_str(), "export"]))
                .query(&[("mimeType", export_mime)]),
            None => self
                .client
                .get(self.endpoint(&["files", doc.id.as_str()]))
                .query(&[("alt", "media"), ("supportsAllDrives", "true")]),
        };

        let resp = req
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let resp = check_status(resp, &doc.name).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_scopes_to_folder_and_skips_trash() {
        let q = list_query(&MaterialFolder::new("abc123"), None);
        assert_eq!(q, "'abc123' in parents and trashed = false");
    }

    #[test]
    fn query_adds_mime_filter() {
        let q = list_query(&MaterialFolder::new("abc"), Some("application/pdf"));
        assert!(q.ends_with(" and mimeType = 'application/pdf'"));
    }

    #[test]
    fn query_values_are_escaped() {
        assert_eq!(quote_query_value("it's"), r"'it\'s'");
        assert_eq!(quote_query_value(r"a\b"), r"'a\\b'");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let store = DriveStore::new(DEFAULT_API_BASE, "t").unwrap();
        assert_eq!(
            store.endpoint(&["files", "x y"]).as_str(),
            "https://www.googleapis.com/drive/v3/files/x%20y"
        );

        let local = DriveStore::new("http://127.0.0.1:8080", "t").unwrap();
        assert_eq!(local.endpoint(&["files"]).as_str(), "http://127.0.0.1:8080/files");
    }

    #[test]
    fn native_files_are_exported() {
        assert_eq!(export_format(Some(MIME_GOOGLE_SLIDES)), Some(MIME_PPTX));
        assert_eq!(export_format(Some(MIME_GOOGLE_DOCS)), Some(MIME_DOCX));
        assert_eq!(export_format(Some("application/pdf")), None);
        assert_eq!(export_format(None), None);
    }

    #[test]
    fn file_list_parses_drive_json() {
        let json = r#"{
            "nextPageToken": "p2",
            "files": [
                {"id": "1", "name": "3주차.pdf", "mimeType": "application/pdf",
                 "createdTime": "2025-03-18T09:30:00.000Z"}
            ]
        }"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.next_page_token.as_deref(), Some("p2"));
        let doc = CandidateDocument::from(list.files.into_iter().next().unwrap());
        assert_eq!(doc.name, "3주차.pdf");
        assert_eq!(doc.created_time.to_rfc3339(), "2025-03-18T09:30:00+00:00");
    }
}
