use marginalia_engine::{
    DEFAULT_CLASS_NAME, DEFAULT_WRAP_TAG, HighlighterOptions, Selector,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where stored anchors are read from when no path is given explicitly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchors_path: Option<PathBuf>,
    pub highlight: HighlightConfig,
}

/// The `[highlight]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub wrap_tag: String,
    pub class_name: String,
    /// `.class`, `#id` or tag selectors whose subtrees are never highlighted
    pub except_selectors: Vec<String>,
    pub verbose: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            wrap_tag: DEFAULT_WRAP_TAG.to_string(),
            class_name: DEFAULT_CLASS_NAME.to_string(),
            except_selectors: Vec::new(),
            verbose: false,
        }
    }
}

impl HighlightConfig {
    pub fn to_options(&self) -> HighlighterOptions {
        HighlighterOptions {
            root: None,
            wrap_tag: self.wrap_tag.clone(),
            except_selectors: self
                .except_selectors
                .iter()
                .map(|s| Selector::parse(s))
                .collect(),
            default_class_name: self.class_name.clone(),
            verbose: self.verbose,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.anchors_path = config
            .anchors_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/marginalia");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
