//! Local directory store.
//!
//! Each course folder is a sub-directory of a configured root. Listing is
//! non-recursive unless `recursive = true`, which supports layouts that keep
//! every week in its own sub-folder (`edtech/3주차/slides.pdf`). Document
//! names are paths relative to the course folder, so the week keyword can sit
//! in a directory name. Walking runs on the blocking pool.
//!
//! # Configuration
//!
//! ```toml
//! [store]
//! kind = "filesystem"
//!
//! [store.filesystem]
//! root = "./materials"
//! recursive = false
//! exclude_globs = ["**/draft-*"]
//! ```

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::FilesystemStoreConfig;
use crate::extract::DocumentKind;
use crate::models::{CandidateDocument, MaterialFolder};

use super::{DocumentStore, StoreError};

/// Office lock files and hidden files are never lecture material.
const DEFAULT_EXCLUDES: &[&str] = &["**/~$*", "**/.*"];

pub struct FilesystemStore {
    root: PathBuf,
    recursive: bool,
    exclude_set: Arc<GlobSet>,
}

impl FilesystemStore {
    pub fn new(root: impl Into<PathBuf>, recursive: bool, exclude_globs: &[String]) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("Filesystem store root does not exist: {}", root.display());
        }
        let mut patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        patterns.extend(exclude_globs.iter().cloned());
        Ok(Self {
            root,
            recursive,
            exclude_set: Arc::new(build_globset(&patterns)?),
        })
    }

    pub fn from_config(config: &FilesystemStoreConfig) -> Result<Self> {
        Self::new(&config.root, config.recursive, &config.exclude_globs)
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(relative);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(StoreError::NotFound(relative.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl DocumentStore for FilesystemStore {
    fn kind(&self) -> &str {
        "filesystem"
    }

    async fn list(
        &self,
        folder: &MaterialFolder,
        mime_filter: Option<&str>,
    ) -> Result<Vec<CandidateDocument>, StoreError> {
        let dir = self.resolve(folder.id())?;
        if !dir.is_dir() {
            return Err(StoreError::NotFound(format!("folder {}", folder)));
        }

        let walk = FolderWalk {
            root: self.root.clone(),
            dir: dir.clone(),
            recursive: self.recursive,
            exclude_set: Arc::clone(&self.exclude_set),
            mime_filter: mime_filter.map(str::to_string),
        };
        tokio::task::spawn_blocking(move || walk.run())
            .await
            .map_err(|e| StoreError::io(dir, std::io::Error::other(e)))?
    }

    async fn download(&self, doc: &CandidateDocument) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(&doc.id)?;
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(doc.id.clone())
            } else {
                StoreError::io(path, e)
            }
        })
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// One blocking listing of a course folder.
struct FolderWalk {
    root: PathBuf,
    dir: PathBuf,
    recursive: bool,
    exclude_set: Arc<GlobSet>,
    mime_filter: Option<String>,
}

impl FolderWalk {
    fn run(self) -> Result<Vec<CandidateDocument>, StoreError> {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name();

        let mut docs = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.dir.clone());
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                StoreError::io(path, source)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let rel_str = slash_path(path.strip_prefix(&self.root).unwrap_or(path));
            if self.exclude_set.is_match(&rel_str) {
                continue;
            }

            // Relative to the course folder, so week sub-folders stay in the
            // name the keyword is matched against ("3주차/slides.pdf").
            let name = slash_path(path.strip_prefix(&self.dir).unwrap_or(path));
            let mime_type = DocumentKind::from_file_name(&name).map(|k| k.content_type().to_string());
            if let Some(mime) = self.mime_filter.as_deref() {
                if mime_type.as_deref() != Some(mime) {
                    continue;
                }
            }

            let metadata = entry.metadata().map_err(|e| {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                StoreError::io(path, source)
            })?;
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .map_err(|e| StoreError::io(path, e))?;

            docs.push(CandidateDocument {
                id: rel_str,
                name,
                mime_type,
                created_time: DateTime::<Utc>::from(created),
            });
        }

        Ok(docs)
    }
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let course = tmp.path().join("edtech");
        fs::create_dir_all(course.join("3주차")).unwrap();
        fs::write(course.join("1주차 강의.pdf"), b"one").unwrap();
        fs::write(course.join("2주차 강의.pptx"), b"two").unwrap();
        fs::write(course.join("notes.txt"), b"notes").unwrap();
        fs::write(course.join("~$2주차 강의.pptx"), b"lock").unwrap();
        fs::write(course.join("3주차").join("slides.pdf"), b"three").unwrap();
        tmp
    }

    #[tokio::test]
    async fn lists_folder_without_descending() {
        let tmp = setup();
        let store = FilesystemStore::new(tmp.path(), false, &[]).unwrap();
        let docs = store.list(&MaterialFolder::new("edtech"), None).await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["1주차 강의.pdf", "2주차 강의.pptx", "notes.txt"]);
        assert_eq!(docs[0].mime_type.as_deref(), Some(crate::extract::MIME_PDF));
        assert_eq!(docs[2].mime_type, None);
    }

    #[tokio::test]
    async fn recursive_listing_includes_week_folders() {
        let tmp = setup();
        let store = FilesystemStore::new(tmp.path(), true, &[]).unwrap();
        let docs = store
            .list(&MaterialFolder::new("edtech"), Some(crate::extract::MIME_PDF))
            .await
            .unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["edtech/1주차 강의.pdf", "edtech/3주차/slides.pdf"]);
        let names: Vec<_> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["1주차 강의.pdf", "3주차/slides.pdf"]);
    }

    #[tokio::test]
    async fn downloads_listed_document() {
        let tmp = setup();
        let store = FilesystemStore::new(tmp.path(), false, &[]).unwrap();
        let docs = store.list(&MaterialFolder::new("edtech"), None).await.unwrap();
        assert_eq!(store.download(&docs[0]).await.unwrap(), b"one");
    }

    #[tokio::test]
    async fn missing_folder_is_an_error() {
        let tmp = setup();
        let store = FilesystemStore::new(tmp.path(), false, &[]).unwrap();
        let err = store.list(&MaterialFolder::new("missing"), None).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn parent_components_are_rejected() {
        let tmp = setup();
        let store = FilesystemStore::new(tmp.path().join("edtech"), false, &[]).unwrap();
        assert!(store.list(&MaterialFolder::new(".."), None).await.is_err());
    }

    #[test]
    fn missing_root_is_rejected() {
        assert!(FilesystemStore::new("/definitely/not/here", false, &[]).is_err());
    }
}
