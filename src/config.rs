//! TOML configuration parsing and validation.
//!
//! ```toml
//! [semester]
//! start_date = "2025-03-04"
//!
//! [matching]
//! keyword_pattern = "{week}주차"
//! digit_boundary = true
//! mime_filter = "application/pdf"
//!
//! [timeouts]
//! list_secs = 15
//! download_secs = 30
//!
//! [store]
//! kind = "filesystem"
//!
//! [store.filesystem]
//! root = "./materials"
//!
//! [courses.edtech]
//! folder = "edtech"
//! subject = "Educational Technology"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::keyword::{KeywordPattern, DEFAULT_KEYWORD_PATTERN, WEEK_PLACEHOLDER};
use crate::models::MaterialFolder;
use crate::store::drive::DEFAULT_API_BASE;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub semester: SemesterConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub courses: BTreeMap<String, CourseConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SemesterConfig {
    pub start_date: NaiveDate,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatchingConfig {
    #[serde(default = "default_keyword_pattern")]
    pub keyword_pattern: String,
    #[serde(default = "default_true")]
    pub digit_boundary: bool,
    /// Only list documents with this content type.
    #[serde(default)]
    pub mime_filter: Option<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            keyword_pattern: default_keyword_pattern(),
            digit_boundary: true,
            mime_filter: None,
        }
    }
}

fn default_keyword_pattern() -> String {
    DEFAULT_KEYWORD_PATTERN.to_string()
}
fn default_true() -> bool {
    true
}

impl MatchingConfig {
    pub fn keyword_pattern(&self) -> Result<KeywordPattern> {
        KeywordPattern::new(self.keyword_pattern.clone(), self.digit_boundary).with_context(|| {
            format!(
                "matching.keyword_pattern must contain {} (got '{}')",
                WEEK_PLACEHOLDER, self.keyword_pattern
            )
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    #[serde(default = "default_list_secs")]
    pub list_secs: u64,
    #[serde(default = "default_download_secs")]
    pub download_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            list_secs: default_list_secs(),
            download_secs: default_download_secs(),
        }
    }
}

fn default_list_secs() -> u64 {
    15
}
fn default_download_secs() -> u64 {
    30
}

impl TimeoutConfig {
    pub fn list(&self) -> Duration {
        Duration::from_secs(self.list_secs)
    }

    pub fn download(&self) -> Duration {
        Duration::from_secs(self.download_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Filesystem,
    Drive,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub kind: StoreKind,
    #[serde(default)]
    pub filesystem: Option<FilesystemStoreConfig>,
    #[serde(default)]
    pub drive: Option<DriveStoreConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemStoreConfig {
    pub root: PathBuf,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DriveStoreConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_token_env() -> String {
    "GOOGLE_DRIVE_ACCESS_TOKEN".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CourseConfig {
    /// Folder handle in the configured store.
    pub folder: String,
    #[serde(default)]
    pub subject: Option<String>,
}

impl CourseConfig {
    pub fn material_folder(&self) -> MaterialFolder {
        MaterialFolder::new(self.folder.clone())
    }
}

impl Config {
    pub fn course(&self, name: &str) -> Result<&CourseConfig> {
        self.courses.get(name).with_context(|| {
            let known: Vec<&str> = self.courses.keys().map(String::as_str).collect();
            format!(
                "Unknown course: '{}'. Configured: {}",
                name,
                known.join(", ")
            )
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    config.matching.keyword_pattern()?;

    if config.timeouts.list_secs == 0 {
        anyhow::bail!("timeouts.list_secs must be > 0");
    }
    if config.timeouts.download_secs == 0 {
        anyhow::bail!("timeouts.download_secs must be > 0");
    }

    match config.store.kind {
        StoreKind::Filesystem if config.store.filesystem.is_none() => {
            anyhow::bail!("store.kind is 'filesystem' but [store.filesystem] is missing")
        }
        StoreKind::Drive if config.store.drive.is_none() => {
            anyhow::bail!("store.kind is 'drive' but [store.drive] is missing")
        }
        _ => {}
    }

    if config.courses.is_empty() {
        anyhow::bail!("at least one [courses.<name>] section is required");
    }
    for (name, course) in &config.courses {
        if course.folder.trim().is_empty() {
            anyhow::bail!("courses.{}.folder must not be empty", name);
        }
    }

    Ok(())
}
