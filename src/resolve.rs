//! Weekly material resolution.
//!
//! Coordinates the full flow for one course folder: list once → match the
//! current and previous week keywords → download → extract → assemble a
//! [`WeeklyBundle`].
//!
//! # Failure policy
//!
//! | Failure | Effect |
//! |---------|--------|
//! | Listing fails or times out | [`ResolveError::StoreUnavailable`], call aborts |
//! | A download fails or times out | document skipped, logged |
//! | Extraction fails / unsupported format | document contributes no text, logged |
//! | Nothing matches | empty current text, `None` previous text |
//!
//! Nothing is retried and nothing is cached; repeating a call re-reads the
//! store.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::extract::{extract_text, DocumentKind, ExtractError};
use crate::keyword::{match_week, KeywordPattern, WeekKeyword};
use crate::models::{CandidateDocument, MaterialFolder, RawDocument, WeekNumber, WeeklyBundle};
use crate::store::{DocumentStore, StoreError};
use crate::week::compute_week;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Listing the folder failed. Fatal for the resolution call.
    #[error("document store unavailable for folder {folder}: {source}")]
    StoreUnavailable {
        folder: String,
        #[source]
        source: StoreError,
    },

    /// One document could not be downloaded. Never escapes `resolve_week`.
    #[error("download of '{document}' failed: {source}")]
    DownloadFailed {
        document: String,
        #[source]
        source: StoreError,
    },

    /// One document yielded no text (malformed or unsupported). Never
    /// escapes `resolve_week`.
    #[error("could not extract text from '{document}': {source}")]
    ExtractFailed {
        document: String,
        #[source]
        source: ExtractError,
    },
}

/// Knobs of a [`Resolver`].
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub pattern: KeywordPattern,
    pub mime_filter: Option<String>,
    pub list_timeout: Duration,
    pub download_timeout: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            pattern: KeywordPattern::default(),
            mime_filter: None,
            list_timeout: Duration::from_secs(15),
            download_timeout: Duration::from_secs(30),
        }
    }
}

impl ResolveOptions {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            pattern: config.matching.keyword_pattern()?,
            mime_filter: config.matching.mime_filter.clone(),
            list_timeout: config.timeouts.list(),
            download_timeout: config.timeouts.download(),
        })
    }
}

/// Resolves weekly bundles against one document store.
pub struct Resolver {
    store: Arc<dyn DocumentStore>,
    options: ResolveOptions,
}

impl Resolver {
    pub fn new(store: Arc<dyn DocumentStore>, options: ResolveOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Computes the week of `reference` and resolves it.
    pub async fn resolve_for_date(
        &self,
        folder: &MaterialFolder,
        semester_start: NaiveDate,
        reference: NaiveDate,
    ) -> Result<WeeklyBundle, ResolveError> {
        let week = compute_week(semester_start, reference);
        self.resolve_week(folder, week).await
    }

    /// Resolves the current and previous week material of `folder`.
    #[instrument(skip_all, fields(store = self.store.kind(), folder = %folder, week = week.get()))]
    pub async fn resolve_week(
        &self,
        folder: &MaterialFolder,
        week: WeekNumber,
    ) -> Result<WeeklyBundle, ResolveError> {
        let current_keyword = self.options.pattern.keyword(week);
        let previous_keyword = week.previous().map(|w| self.options.pattern.keyword(w));

        let candidates = self.list(folder).await?;
        debug!(candidates = candidates.len(), "listed folder");

        let mut bundle = WeeklyBundle {
            week: Some(week),
            ..Default::default()
        };

        let current = sorted_matches(&candidates, &current_keyword);
        debug!(keyword = %current_keyword, matches = current.len(), "current week");
        let last = current.len().checked_sub(1);
        for (idx, doc) in current.iter().enumerate() {
            bundle.current_week_documents.push(doc.name.clone());

            let bytes = match self.fetch(doc).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "skipping current week document");
                    continue;
                }
            };

            match extract_document(doc, &bytes) {
                Ok(text) => {
                    bundle.current_week_text.push_str(&text);
                    bundle.current_week_text.push('\n');
                }
                Err(e) => warn!(error = %e, "current week document has no text"),
            }

            if Some(idx) == last {
                bundle.current_week_raw = Some(RawDocument {
                    name: doc.name.clone(),
                    content_type: raw_content_type(doc).to_string(),
                    bytes,
                });
            }
        }

        if let Some(keyword) = previous_keyword {
            let previous = sorted_matches(&candidates, &keyword);
            debug!(keyword = %keyword, matches = previous.len(), "previous week");
            // Review material is a single document: the most recent one.
            if let Some(doc) = previous.last() {
                bundle.previous_week_document = Some(doc.name.clone());
                bundle.previous_week_text = match self.read(doc).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!(error = %e, "previous week document unavailable");
                        None
                    }
                };
            }
        }

        info!(
            current_documents = bundle.current_week_documents.len(),
            current_chars = bundle.current_week_text.chars().count(),
            has_previous = bundle.previous_week_text.is_some(),
            "resolved weekly material"
        );
        Ok(bundle)
    }

    async fn list(&self, folder: &MaterialFolder) -> Result<Vec<CandidateDocument>, ResolveError> {
        let listing = self.store.list(folder, self.options.mime_filter.as_deref());
        let result = match tokio::time::timeout(self.options.list_timeout, listing).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.options.list_timeout)),
        };
        result.map_err(|source| ResolveError::StoreUnavailable {
            folder: folder.to_string(),
            source,
        })
    }

    async fn fetch(&self, doc: &CandidateDocument) -> Result<Vec<u8>, ResolveError> {
        let download = self.store.download(doc);
        let result = match tokio::time::timeout(self.options.download_timeout, download).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.options.download_timeout)),
        };
        result.map_err(|source| ResolveError::DownloadFailed {
            document: doc.name.clone(),
            source,
        })
    }

    async fn read(&self, doc: &CandidateDocument) -> Result<String, ResolveError> {
        let bytes = self.fetch(doc).await?;
        extract_document(doc, &bytes)
    }
}

/// Matches of `keyword`, oldest first. The sort is stable, so documents
/// created at the same instant keep the store's order.
fn sorted_matches(candidates: &[CandidateDocument], keyword: &WeekKeyword) -> Vec<CandidateDocument> {
    let mut matches = match_week(candidates, keyword);
    matches.sort_by_key(|d| d.created_time);
    matches
}

fn extract_document(doc: &CandidateDocument, bytes: &[u8]) -> Result<String, ResolveError> {
    extract_text(bytes, &doc.name, doc.mime_type.as_deref()).map_err(|source| {
        ResolveError::ExtractFailed {
            document: doc.name.clone(),
            source,
        }
    })
}

fn raw_content_type(doc: &CandidateDocument) -> &str {
    match DocumentKind::classify(&doc.name, doc.mime_type.as_deref()) {
        Some(kind) => kind.content_type(),
        None => doc.mime_type.as_deref().unwrap_or(FALLBACK_CONTENT_TYPE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn doc(name: &str, mime: Option<&str>) -> CandidateDocument {
        CandidateDocument {
            id: name.to_string(),
            name: name.to_string(),
            mime_type: mime.map(str::to_string),
            created_time: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn raw_content_type_prefers_known_kind() {
        assert_eq!(raw_content_type(&doc("a.pdf", None)), "application/pdf");
        assert_eq!(
            raw_content_type(&doc("deck", Some(crate::store::drive::MIME_GOOGLE_SLIDES))),
            crate::extract::MIME_PPTX
        );
        assert_eq!(raw_content_type(&doc("a.hwp", Some("application/x-hwp"))), "application/x-hwp");
        assert_eq!(raw_content_type(&doc("a.bin", None)), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn matches_sort_oldest_first_and_keep_ties_stable() {
        let mut a = doc("a 3주차", None);
        let mut b = doc("b 3주차", None);
        let mut c = doc("c 3주차", None);
        a.created_time = Utc.timestamp_opt(30, 0).unwrap();
        b.created_time = Utc.timestamp_opt(10, 0).unwrap();
        c.created_time = Utc.timestamp_opt(10, 0).unwrap();
        let kw = KeywordPattern::default().keyword(WeekNumber::new(3).unwrap());
        let names: Vec<_> = sorted_matches(&[a, b, c], &kw)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["b 3주차", "c 3주차", "a 3주차"]);
    }
}
