//! In-memory [`DocumentStore`] for tests and for callers that already hold the files.
//!
//! Documents live in a `Vec` behind `std::sync::RwLock`, listed in insertion
//! order. Individual downloads (or whole folder listings) can be marked as
//! failing to exercise the resolver's skip paths.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{CandidateDocument, MaterialFolder};

use super::{DocumentStore, StoreError};

struct StoredDocument {
    folder: String,
    doc: CandidateDocument,
    bytes: Vec<u8>,
}

/// In-memory store.
pub struct InMemoryStore {
    docs: RwLock<Vec<StoredDocument>>,
    failing_downloads: RwLock<HashSet<String>>,
    failing_folders: RwLock<HashSet<String>>,
    list_calls: RwLock<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            failing_downloads: RwLock::new(HashSet::new()),
            failing_folders: RwLock::new(HashSet::new()),
            list_calls: RwLock::new(0),
        }
    }

    /// Adds a document to `folder` and returns its generated ID.
    pub fn insert(
        &self,
        folder: &str,
        name: &str,
        mime_type: Option<&str>,
        created_time: DateTime<Utc>,
        bytes: Vec<u8>,
    ) -> String {
        let mut docs = self.docs.write().unwrap_or_else(|e| e.into_inner());
        let id = format!("mem-{}", docs.len() + 1);
        docs.push(StoredDocument {
            folder: folder.to_string(),
            doc: CandidateDocument {
                id: id.clone(),
                name: name.to_string(),
                mime_type: mime_type.map(str::to_string),
                created_time,
            },
            bytes,
        });
        id
    }

    /// Makes every download of document `id` fail.
    pub fn fail_download(&self, id: &str) {
        self.failing_downloads
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string());
    }

    /// Makes every listing of `folder` fail.
    pub fn fail_listing(&self, folder: &str) {
        self.failing_folders
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(folder.to_string());
    }

    /// Number of `list` calls served so far.
    pub fn list_calls(&self) -> usize {
        *self.list_calls.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn kind(&self) -> &str {
        "memory"
    }

    async fn list(
        &self,
        folder: &MaterialFolder,
        mime_filter: Option<&str>,
    ) -> Result<Vec<CandidateDocument>, StoreError> {
        *self.list_calls.write().unwrap_or_else(|e| e.into_inner()) += 1;

        if self
            .failing_folders
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(folder.id())
        {
            return Err(StoreError::Request(format!(
                "listing {} unavailable",
                folder
            )));
        }

        let docs = self.docs.read().unwrap_or_else(|e| e.into_inner());
        Ok(docs
            .iter()
            .filter(|d| d.folder == folder.id())
            .filter(|d| match mime_filter {
                Some(mime) => d.doc.mime_type.as_deref() == Some(mime),
                None => true,
            })
            .map(|d| d.doc.clone())
            .collect())
    }

    async fn download(&self, doc: &CandidateDocument) -> Result<Vec<u8>, StoreError> {
        if self
            .failing_downloads
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&doc.id)
        {
            return Err(StoreError::Request(format!("download of {} failed", doc.id)));
        }
        let docs = self.docs.read().unwrap_or_else(|e| e.into_inner());
        docs.iter()
            .find(|d| d.doc.id == doc.id)
            .map(|d| d.bytes.clone())
            .ok_or_else(|| StoreError::NotFound(doc.id.clone()))
    }
}
