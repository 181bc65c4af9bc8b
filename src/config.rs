use anyhow::{Context, Result};
use markin_parse::{DEFAULT_MAX_NESTING_DEPTH, ParseMode, ParseOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up in the current directory when `--config` is absent.
pub const CONFIG_FILE: &str = "markin.json";

/// Top-level markin.json schema.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkinConfig {
    #[serde(default)]
    pub mode: ParseMode,

    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// File extensions (without the dot) that `check` picks up when walking
    /// a directory.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default)]
    pub html: HtmlConfig,
}

fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_NESTING_DEPTH
}

fn default_extensions() -> Vec<String> {
    vec!["markin".to_string(), "mkn".to_string()]
}

impl Default for MarkinConfig {
    fn default() -> Self {
        Self {
            mode: ParseMode::default(),
            max_nesting_depth: default_max_nesting_depth(),
            extensions: default_extensions(),
            html: HtmlConfig::default(),
        }
    }
}

impl MarkinConfig {
    /// Parser options from the config, with `mode` overriding the configured
    /// mode when given.
    pub fn parse_options(&self, mode: Option<ParseMode>) -> ParseOptions {
        ParseOptions {
            mode: mode.unwrap_or(self.mode),
            max_nesting_depth: self.max_nesting_depth,
        }
    }

    /// Whether `path` has one of the configured extensions.
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.trim_start_matches('.') == ext))
    }
}

/// Settings for `build` page output.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlConfig {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub lang: Option<String>,

    #[serde(default)]
    pub stylesheet: Option<String>,
}

/// Load config from `explicit`, or from markin.json in the current
/// directory, or return defaults if neither exists.
///
/// An explicitly named file must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<MarkinConfig> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = PathBuf::from(CONFIG_FILE);
            if !path.exists() {
                return Ok(MarkinConfig::default());
            }
            path
        }
    };

    let raw = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config: MarkinConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    Ok(config)
}
