//! Application configuration for nbshelf.
//!
//! User config lives at `~/.nbshelf/nbshelf.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NbshelfError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "nbshelf.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".nbshelf";

/// Default library file name inside the config directory.
const LIBRARY_FILE_NAME: &str = "library.json";

/// Question sent to each notebook during enrichment.
pub const ENRICH_QUESTION: &str = "What is the content of this notebook? What topics are covered? \
     Provide a complete overview briefly and concisely";

// ---------------------------------------------------------------------------
// Config structs (matching nbshelf.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub discovery: DiscoverySection,

    #[serde(default)]
    pub enrichment: EnrichmentSection,

    #[serde(default)]
    pub titles: TitlesSection,

    #[serde(default)]
    pub library: LibrarySection,
}

/// `[browser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// WebDriver endpoint (e.g. a local chromedriver).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Notebook list page.
    #[serde(default = "default_home_url")]
    pub home_url: String,

    /// Chrome profile directory holding the signed-in session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data_dir: Option<String>,

    /// Page load timeout for `goto`.
    #[serde(default = "default_page_load_timeout_ms")]
    pub page_load_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: true,
            home_url: default_home_url(),
            user_data_dir: None,
            page_load_timeout_ms: default_page_load_timeout_ms(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_home_url() -> String {
    "https://notebooklm.google.com/".into()
}
fn default_page_load_timeout_ms() -> u64 {
    60_000
}
fn default_true() -> bool {
    true
}

/// `[discovery]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySection {
    #[serde(default = "default_hydration_attempts")]
    pub hydration_attempts: u32,

    #[serde(default = "default_hydration_interval_ms")]
    pub hydration_interval_ms: u64,

    #[serde(default = "default_resettle_attempts")]
    pub resettle_attempts: u32,

    #[serde(default = "default_resettle_interval_ms")]
    pub resettle_interval_ms: u64,

    /// How long a row click may take to land on a notebook page.
    #[serde(default = "default_detail_url_timeout_ms")]
    pub detail_url_timeout_ms: u64,

    /// Substring identifying a notebook detail URL.
    #[serde(default = "default_detail_url_pattern")]
    pub detail_url_pattern: String,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            hydration_attempts: default_hydration_attempts(),
            hydration_interval_ms: default_hydration_interval_ms(),
            resettle_attempts: default_resettle_attempts(),
            resettle_interval_ms: default_resettle_interval_ms(),
            detail_url_timeout_ms: default_detail_url_timeout_ms(),
            detail_url_pattern: default_detail_url_pattern(),
        }
    }
}

fn default_hydration_attempts() -> u32 {
    4
}
fn default_hydration_interval_ms() -> u64 {
    5_000
}
fn default_resettle_attempts() -> u32 {
    10
}
fn default_resettle_interval_ms() -> u64 {
    3_000
}
fn default_detail_url_timeout_ms() -> u64 {
    15_000
}
fn default_detail_url_pattern() -> String {
    "/notebook/".into()
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSection {
    #[serde(default = "default_question")]
    pub question: String,

    /// Pause between notebooks.
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,

    /// Upper bound on waiting for one answer.
    #[serde(default = "default_answer_timeout_secs")]
    pub answer_timeout_secs: u64,
}

impl Default for EnrichmentSection {
    fn default() -> Self {
        Self {
            question: default_question(),
            pause_ms: default_pause_ms(),
            answer_timeout_secs: default_answer_timeout_secs(),
        }
    }
}

fn default_question() -> String {
    ENRICH_QUESTION.into()
}
fn default_pause_ms() -> u64 {
    2_000
}
fn default_answer_timeout_secs() -> u64 {
    120
}

/// `[titles]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitlesSection {
    /// Fixed wait after opening a notebook before reading its title.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

impl Default for TitlesSection {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            pause_ms: default_pause_ms(),
        }
    }
}

fn default_settle_ms() -> u64 {
    5_000
}

/// `[library]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibrarySection {
    /// Library file path; defaults to `~/.nbshelf/library.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime discovery timing and matching rules.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub home_url: String,
    pub page_load_timeout: Duration,
    pub hydration_attempts: u32,
    pub hydration_interval: Duration,
    pub resettle_attempts: u32,
    pub resettle_interval: Duration,
    pub detail_url_timeout: Duration,
    pub detail_url_pattern: String,
}

impl From<&AppConfig> for DiscoveryConfig {
    fn from(config: &AppConfig) -> Self {
        let d = &config.discovery;
        Self {
            home_url: config.browser.home_url.clone(),
            page_load_timeout: Duration::from_millis(config.browser.page_load_timeout_ms),
            hydration_attempts: d.hydration_attempts,
            hydration_interval: Duration::from_millis(d.hydration_interval_ms),
            resettle_attempts: d.resettle_attempts,
            resettle_interval: Duration::from_millis(d.resettle_interval_ms),
            detail_url_timeout: Duration::from_millis(d.detail_url_timeout_ms),
            detail_url_pattern: d.detail_url_pattern.clone(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Runtime enrichment settings.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub question: String,
    pub pause: Duration,
    pub answer_timeout: Duration,
    pub page_load_timeout: Duration,
}

impl From<&AppConfig> for EnrichConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            question: config.enrichment.question.clone(),
            pause: Duration::from_millis(config.enrichment.pause_ms),
            answer_timeout: Duration::from_secs(config.enrichment.answer_timeout_secs),
            page_load_timeout: Duration::from_millis(config.browser.page_load_timeout_ms),
        }
    }
}

/// Runtime title-audit settings.
#[derive(Debug, Clone)]
pub struct TitleConfig {
    pub settle: Duration,
    pub pause: Duration,
    pub page_load_timeout: Duration,
}

impl From<&AppConfig> for TitleConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            settle: Duration::from_millis(config.titles.settle_ms),
            pause: Duration::from_millis(config.titles.pause_ms),
            page_load_timeout: Duration::from_millis(config.browser.page_load_timeout_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.nbshelf/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NbshelfError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.nbshelf/nbshelf.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve the library file path: config value (with `~/` expanded) or the default.
pub fn library_path(config: &AppConfig) -> Result<PathBuf> {
    match config.library.path.as_deref() {
        Some(p) => expand_home(p),
        None => Ok(config_dir()?.join(LIBRARY_FILE_NAME)),
    }
}

fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| NbshelfError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NbshelfError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NbshelfError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NbshelfError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NbshelfError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NbshelfError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
