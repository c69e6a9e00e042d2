//! Core data models used throughout the resolver.
//!
//! These types represent the folder handles, store listings, and resolution
//! results that flow from a [`DocumentStore`](crate::store::DocumentStore)
//! through the [`Resolver`](crate::resolve::Resolver).

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 1-based semester week.
///
/// Always `>= 1`; construct through [`WeekNumber::new`] or
/// [`compute_week`](crate::week::compute_week).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WeekNumber(u32);

impl WeekNumber {
    pub const FIRST: WeekNumber = WeekNumber(1);

    /// Returns `None` for week 0.
    pub fn new(n: u32) -> Option<Self> {
        if n == 0 {
            None
        } else {
            Some(Self(n))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The preceding week, or `None` for week 1.
    pub fn previous(self) -> Option<Self> {
        Self::new(self.0 - 1)
    }
}

impl std::fmt::Display for WeekNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to one course's folder in a document store.
///
/// For the Drive store this is the folder ID; for the filesystem store it is
/// a directory relative to the configured root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MaterialFolder(String);

impl MaterialFolder {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MaterialFolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a store listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateDocument {
    /// Store-internal identifier passed back to `download`.
    pub id: String,
    /// Display name, matched against week keywords.
    pub name: String,
    /// Declared content type, if the store reports one.
    pub mime_type: Option<String>,
    pub created_time: DateTime<Utc>,
}

/// Downloaded bytes of a document, handed to the caller for preview or
/// download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Output of one resolution call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WeeklyBundle {
    pub week: Option<WeekNumber>,
    /// Text of the most recent previous-week document. `None` in week 1, when
    /// nothing matched, or when that document could not be read.
    pub previous_week_text: Option<String>,
    /// Texts of every readable current-week document, oldest first, each
    /// followed by `\n`. Empty when nothing matched.
    pub current_week_text: String,
    /// Bytes of the most recently created current-week document.
    #[serde(skip)]
    pub current_week_raw: Option<RawDocument>,
    /// Names of the matched current-week documents, oldest first.
    pub current_week_documents: Vec<String>,
    /// Name of the previous-week document that was used, if any.
    pub previous_week_document: Option<String>,
}

impl WeeklyBundle {
    /// True when no current-week document was found or readable.
    pub fn is_current_week_empty(&self) -> bool {
        self.current_week_text.is_empty() && self.current_week_raw.is_none()
    }
}
