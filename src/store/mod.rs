//! Document store abstraction.
//!
//! The resolver never talks to a concrete backend. It receives a
//! [`DocumentStore`] capability with two operations: list one folder, and
//! download one document. Any backend with that shape can be plugged in.
//!
//! | Backend | Module | Folder handle |
//! |---------|--------|---------------|
//! | In-memory | [`memory`] | any string |
//! | Local directory | [`filesystem`] | sub-directory of the root |
//! | Google Drive v3 | [`drive`] | Drive folder ID |
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use lecture_brief::models::{CandidateDocument, MaterialFolder};
//! use lecture_brief::store::{DocumentStore, StoreError};
//!
//! pub struct EmptyStore;
//!
//! #[async_trait]
//! impl DocumentStore for EmptyStore {
//!     fn kind(&self) -> &str { "empty" }
//!
//!     async fn list(
//!         &self,
//!         _folder: &MaterialFolder,
//!         _mime_filter: Option<&str>,
//!     ) -> Result<Vec<CandidateDocument>, StoreError> {
//!         Ok(vec![])
//!     }
//!
//!     async fn download(&self, doc: &CandidateDocument) -> Result<Vec<u8>, StoreError> {
//!         Err(StoreError::NotFound(doc.id.clone()))
//!     }
//! }
//! ```

pub mod drive;
pub mod filesystem;
pub mod memory;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::{Config, StoreKind};
use crate::models::{CandidateDocument, MaterialFolder};

pub use drive::DriveStore;
pub use filesystem::FilesystemStore;
pub use memory::InMemoryStore;

/// Failure of a single store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport-level failure (connection refused, DNS, TLS).
    #[error("request failed: {0}")]
    Request(String),

    /// The store answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The store's response could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The folder or document does not exist (or is not visible).
    #[error("not found: {0}")]
    NotFound(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Read-only access to folders of lecture material.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend identifier (`"drive"`, `"filesystem"`, ...) for logs.
    fn kind(&self) -> &str;

    /// Lists the documents directly inside `folder`.
    ///
    /// With `mime_filter`, only documents whose declared content type equals
    /// it are returned. Listing order is the store's own order; the resolver
    /// uses it as a tie-break.
    async fn list(
        &self,
        folder: &MaterialFolder,
        mime_filter: Option<&str>,
    ) -> Result<Vec<CandidateDocument>, StoreError>;

    /// Downloads the full content of one listed document.
    async fn download(&self, doc: &CandidateDocument) -> Result<Vec<u8>, StoreError>;
}

/// Builds the store selected by `[store].kind`.
///
/// The Drive token is read here, from the environment variable named in
/// `[store.drive].token_env`; stores themselves never read ambient state.
pub fn build_store(config: &Config) -> Result<Box<dyn DocumentStore>> {
    match config.store.kind {
        StoreKind::Filesystem => {
            let fs_config = config
                .store
                .filesystem
                .as_ref()
                .context("[store.filesystem] section missing")?;
            Ok(Box::new(FilesystemStore::from_config(fs_config)?))
        }
        StoreKind::Drive => {
            let drive_config = config
                .store
                .drive
                .as_ref()
                .context("[store.drive] section missing")?;
            let token = std::env::var(&drive_config.token_env).with_context(|| {
                format!("{} environment variable not set", drive_config.token_env)
            })?;
            if token.trim().is_empty() {
                bail!("{} is empty", drive_config.token_env);
            }
            Ok(Box::new(DriveStore::new(
                drive_config.api_base.clone(),
                token,
            )?))
        }
    }
}
