use richmark_engine::editing::{HistoryOptions, MergePolicy};
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

    #[error("Invalid value for {field} in {config_path}: {reason}")]
    InvalidValue {
        config_path: PathBuf,
        field: &'static str,
        reason: &'static str,
    },
}

/// Editor settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history: HistoryConfig,
    pub hints: HintConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Undo steps kept before the oldest are dropped.
    pub max_depth: usize,
    /// Merged typing or deleting stays under this many tokens per step.
    pub merge_limit: usize,
    pub merge_across_whitespace: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        let options = HistoryOptions::default();
        Self {
            max_depth: options.max_depth,
            merge_limit: options.merge.limit,
            merge_across_whitespace: options.merge.across_whitespace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintConfig {
    /// Whether newly created wrappers show their markdown delimiters.
    pub materialize: bool,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self { materialize: true }
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

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        config.validate(config_path)?;

        Ok(Some(config))
    }

    /// Loads the user config, falling back to defaults when there is none.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        Ok(Self::load_from_path(&config_path)?.unwrap_or_default())
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

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/richmark");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn merge_policy(&self) -> MergePolicy {
        MergePolicy {
            limit: self.history.merge_limit,
            across_whitespace: self.history.merge_across_whitespace,
        }
    }

    pub fn history_options(&self) -> HistoryOptions {
        HistoryOptions {
            max_depth: self.history.max_depth,
            merge: self.merge_policy(),
        }
    }

    fn validate(&self, config_path: &Path) -> Result<(), ConfigError> {
        if self.history.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                config_path: config_path.to_path_buf(),
                field: "history.max_depth",
                reason: "must keep at least one undo step",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use richmark_engine::editing::{Document, History, InsertText, WrapFormat};
    use richmark_engine::models::Format;
    use richmark_engine::selection::Interval;
    use richmark_engine::models::parse_markup;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/richmark/config.toml"));
    }

    #[test]
    fn test_defaults_match_engine() {
        let config = Config::default();
        assert_eq!(config.history_options(), HistoryOptions::default());
        assert!(config.hints.materialize);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config_content = r#"
[history]
merge_limit = 4
"#;
        let config: Config = toml::from_str(config_content).unwrap();
        assert_eq!(config.history.merge_limit, 4);
        assert_eq!(config.history.max_depth, 200);
        assert!(!config.history.merge_across_whitespace);
        assert!(config.hints.materialize);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let test_config = Config {
            history: HistoryConfig {
                max_depth: 50,
                merge_limit: 20,
                merge_across_whitespace: true,
            },
            hints: HintConfig { materialize: false },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[history\nmax_depth = 3").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[history]\nmax_depth = 0\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "history.max_depth",
                ..
            }
        ));
    }

    #[test]
    fn test_configured_history_merges_across_whitespace() {
        let config: Config = toml::from_str("[history]\nmerge_across_whitespace = true\n").unwrap();
        let mut doc = Document::from_roots([parse_markup("", false)]).unwrap();
        let block = doc.block_ids()[0];
        let mut history = History::new(config.history_options());

        for (i, ch) in "a b".chars().enumerate() {
            history
                .execute(&mut doc, Box::new(InsertText::new(block, i, ch.to_string())))
                .unwrap();
        }

        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_hint_setting_controls_new_wrappers() {
        for (materialize, expected) in [(true, "**a**b"), (false, "ab")] {
            let config = Config {
                hints: HintConfig { materialize },
                ..Config::default()
            };
            let mut doc = Document::from_roots([parse_markup("ab", false)]).unwrap();
            let block = doc.block_ids()[0];
            let mut history = History::new(config.history_options());

            let wrap = WrapFormat::new(block, Interval::new(0, 1), Format::Bold, config.hints.materialize);
            history.execute(&mut doc, Box::new(wrap)).unwrap();

            assert_eq!(doc.root(block).unwrap().display_text(), expected);
        }
    }
}
