//! Site configuration module.
//!
//! Handles loading, validating, and merging `site.toml`. Stock defaults are the
//! base layer; the user's file is deep-merged on top, so it only needs to name
//! the values it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Writing"
//! description = ""
//! url = ""                    # Absolute base URL, used by the feed
//! author = ""                 # Name in the copyright footer
//!
//! [paths]                     # Relative to the project root
//! content = "pages"
//! writing = "pages/writing"
//! drafts = "pages/drafts"
//! assets = "assets"
//! stylesheet = "styles.css"
//! output = "dist"
//!
//! [markdown]
//! hard_breaks = true          # Single newlines become <br />
//! footnotes = true
//!
//! [watch]
//! debounce_ms = 250
//!
//! [logging]
//! default = "info"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config filename, looked up relative to the project root.
pub const CONFIG_FILENAME: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity: title, description, base URL, author.
    pub site: SiteInfo,
    /// Input and output locations.
    pub paths: PathsConfig,
    /// Markdown rendering switches.
    pub markdown: MarkdownConfig,
    /// Watch mode settings.
    pub watch: WatchConfig,
    /// Log filter settings.
    pub logging: LoggingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watch.debounce_ms == 0 || self.watch.debounce_ms > 10_000 {
            return Err(ConfigError::Validation(
                "watch.debounce_ms must be 1-10000".into(),
            ));
        }
        let url = &self.site.url;
        if !url.is_empty() && !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "site.url must be empty or start with http:// or https://".into(),
            ));
        }
        if Path::new(&self.paths.output) == Path::new(&self.paths.content) {
            return Err(ConfigError::Validation(
                "paths.output must differ from paths.content".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.default.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.default must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Resolve the configured relative paths against the project root.
    pub fn resolve_paths(&self, root: &Path) -> SitePaths {
        let paths = &self.paths;
        SitePaths {
            content: root.join(&paths.content),
            writing: root.join(&paths.writing),
            drafts: root.join(&paths.drafts),
            assets: root.join(&paths.assets),
            stylesheet: root.join(&paths.stylesheet),
            output: root.join(&paths.output),
        }
    }
}

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    pub title: String,
    pub description: String,
    /// Absolute base URL of the published site. Feed links are built from it.
    pub url: String,
    pub author: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "Writing".to_string(),
            description: String::new(),
            url: String::new(),
            author: String::new(),
        }
    }
}

impl SiteInfo {
    /// Base URL without a trailing slash, or `None` when unset.
    pub fn base_url(&self) -> Option<&str> {
        let base = self.url.trim().trim_end_matches('/');
        (!base.is_empty()).then_some(base)
    }

    /// Absolute URL of a page in the output root.
    pub fn page_url(&self, filename: &str) -> Option<String> {
        self.base_url().map(|base| format!("{base}/{filename}"))
    }
}

/// Project-relative locations of inputs and outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Every `*.md` below this directory is compiled.
    pub content: String,
    /// Dated entries listed on the index page and in the feed.
    pub writing: String,
    /// Where `quill new` puts fresh entries.
    pub drafts: String,
    pub assets: String,
    pub stylesheet: String,
    pub output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: "pages".to_string(),
            writing: "pages/writing".to_string(),
            drafts: "pages/drafts".to_string(),
            assets: "assets".to_string(),
            stylesheet: "styles.css".to_string(),
            output: "dist".to_string(),
        }
    }
}

/// Absolute paths, resolved from [`PathsConfig`] against a project root.
#[derive(Debug, Clone, PartialEq)]
pub struct SitePaths {
    pub content: PathBuf,
    pub writing: PathBuf,
    pub drafts: PathBuf,
    pub assets: PathBuf,
    pub stylesheet: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Render single newlines inside a paragraph as `<br />`.
    pub hard_breaks: bool,
    pub footnotes: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            hard_breaks: true,
            footnotes: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Quiet period after the last qualifying change before a rebuild runs.
    pub debounce_ms: u64,
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 250 }
    }
}

/// Log filter settings. `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for every target without an explicit override.
    pub default: String,
    /// Per-target overrides, e.g. `quill::watch = "debug"`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: "info".to_string(),
            modules: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Render as an `EnvFilter` directive string.
    pub fn filter_directives(&self) -> String {
        let mut filter = self.default.clone();
        for (module, level) in &self.modules {
            filter.push_str(&format!(",{module}={level}"));
        }
        filter
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. `Ok(None)` when the file is absent.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load the config file at `config_path` over the stock defaults.
///
/// A missing file yields the defaults; a malformed or invalid one is an error.
pub fn load_config(config_path: &Path) -> Result<SiteConfig, ConfigError> {
    let merged = match load_raw_config(config_path)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `site.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Quill Configuration
# ===================
# Every key is optional. Values shown are the defaults.

[site]
# Used in <title> of the index page and as the feed title.
title = "Writing"
# Feed channel description and fallback meta description.
description = ""
# Absolute base URL of the published site, e.g. "https://example.com".
# Required for correct feed links; relative links are rewritten against it.
url = ""
# Name shown in the copyright footer of every non-index page.
author = ""

[paths]
# Every *.md file under `content` becomes a page in `output`.
content = "pages"
# Files named YYYY-MM-DD-slug.md here are listed by {{writing}} and the feed.
writing = "pages/writing"
# `quill new` writes here. Drafts are compiled but never listed.
drafts = "pages/drafts"
assets = "assets"
stylesheet = "styles.css"
output = "dist"

[markdown]
# Treat single newlines inside a paragraph as line breaks.
hard_breaks = true
footnotes = true

[watch]
# Quiet period (milliseconds) after the last change before rebuilding.
debounce_ms = 250

[logging]
# error | warn | info | debug | trace. RUST_LOG overrides this.
default = "info"

[logging.modules]
# "quill::watch" = "debug"
"##
}
