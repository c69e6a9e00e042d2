//! Week keyword rendering, name normalization, and week matching.
//!
//! Document names and keywords are compared in a canonical form: NFKC
//! normalized, lowercased, with all whitespace removed. A document belongs to
//! a week when its normalized name contains the normalized keyword, so
//! `"2025 - 3 주차 보충자료.pdf"` matches the keyword `"3주차"`.
//!
//! With the digit boundary enabled (the default), a keyword that starts or
//! ends with a digit must not be glued to another digit in the name. That
//! keeps `"1주차"` from matching `"11주차"` and `"week1"` from matching
//! `"week12"`.

use unicode_normalization::UnicodeNormalization;

use crate::models::{CandidateDocument, WeekNumber};

/// Placeholder substituted with the week number in a keyword pattern.
pub const WEEK_PLACEHOLDER: &str = "{week}";

/// Korean "week N" tag used by default.
pub const DEFAULT_KEYWORD_PATTERN: &str = "{week}주차";

/// Upper bound on canonicalization passes; real names settle after two.
const MAX_NORMALIZE_PASSES: usize = 4;

/// Canonical comparison form of `text`.
///
/// Dropping whitespace can bring a base letter next to a combining mark, and
/// NFKC can turn compatibility characters such as `¨` into a space plus a
/// mark, so the pass is repeated until the output is stable.
pub fn normalize(text: &str) -> String {
    let mut current = canonical_pass(text);
    for _ in 1..MAX_NORMALIZE_PASSES {
        let next = canonical_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn canonical_pass(text: &str) -> String {
    let folded = text.nfkc().collect::<String>().to_lowercase();
    let compact: String = folded.chars().filter(|c| !c.is_whitespace()).collect();
    compact.nfkc().collect()
}

/// Renders week keywords from a pattern such as `"{week}주차"` or `"week {week}"`.
#[derive(Debug, Clone)]
pub struct KeywordPattern {
    pattern: String,
    digit_boundary: bool,
}

impl KeywordPattern {
    /// Returns `None` when `pattern` lacks the `{week}` placeholder.
    pub fn new(pattern: impl Into<String>, digit_boundary: bool) -> Option<Self> {
        let pattern = pattern.into();
        if !pattern.contains(WEEK_PLACEHOLDER) {
            return None;
        }
        Some(Self {
            pattern,
            digit_boundary,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn keyword(&self, week: WeekNumber) -> WeekKeyword {
        let raw = self.pattern.replace(WEEK_PLACEHOLDER, &week.to_string());
        WeekKeyword::new(raw, self.digit_boundary)
    }
}

impl Default for KeywordPattern {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_KEYWORD_PATTERN.to_string(),
            digit_boundary: true,
        }
    }
}

/// A rendered week tag together with its normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekKeyword {
    raw: String,
    normalized: String,
    digit_boundary: bool,
}

impl WeekKeyword {
    pub fn new(raw: impl Into<String>, digit_boundary: bool) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self {
            raw,
            normalized,
            digit_boundary,
        }
    }

    /// Keyword as rendered from the pattern.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// True when the normalized `name` contains this keyword.
    pub fn matches(&self, name: &str) -> bool {
        if self.normalized.is_empty() {
            return false;
        }
        let name = normalize(name);
        if !self.digit_boundary {
            return name.contains(&self.normalized);
        }

        let starts_with_digit = self
            .normalized
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());
        let ends_with_digit = self
            .normalized
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit());

        name.match_indices(self.normalized.as_str()).any(|(at, m)| {
            let before = name[..at].chars().next_back();
            let after = name[at + m.len()..].chars().next();
            let glued_before = starts_with_digit && before.is_some_and(|c| c.is_ascii_digit());
            let glued_after = ends_with_digit && after.is_some_and(|c| c.is_ascii_digit());
            !glued_before && !glued_after
        })
    }
}

impl std::fmt::Display for WeekKeyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Candidates whose names contain `keyword`, in their original order.
pub fn match_week(candidates: &[CandidateDocument], keyword: &WeekKeyword) -> Vec<CandidateDocument> {
    candidates
        .iter()
        .filter(|c| keyword.matches(&c.name))
        .cloned()
        .collect()
}
