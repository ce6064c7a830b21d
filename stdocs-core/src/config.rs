use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{BackendLoader, DumpFileBackend, EmbeddedBackend};
use crate::grammar::{DEFAULT_THEME, GrammarDefinition, ThemeDefinition};
use crate::highlighter::HighlighterSettings;
use crate::shim::ShimSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parsing(#[from] toml::de::Error),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub highlighter: HighlighterConfig,
    pub shim: ShimSettings,
}

impl Config {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = read_file(path.as_ref())?;
        let config: Config = toml::from_str(&data)?;

        Ok(config)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct HighlighterConfig {
    /// Name of a bundled syntect theme. Ignored when `theme_file` is set.
    pub theme: String,
    /// Path to a `.tmTheme` file.
    pub theme_file: Option<PathBuf>,
    /// Path to a `.sublime-syntax` grammar replacing the bundled one.
    pub grammar_file: Option<PathBuf>,
    /// Path to an uncompressed syntect syntax dump to use instead of the
    /// bundled syntaxes.
    pub backend_dump: Option<PathBuf>,
    pub max_consecutive_failures: Option<u32>,
}

impl Default for HighlighterConfig {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            theme_file: None,
            grammar_file: None,
            backend_dump: None,
            max_consecutive_failures: None,
        }
    }
}

impl HighlighterConfig {
    /// Read any referenced grammar and theme files.
    pub fn settings(&self) -> Result<HighlighterSettings, ConfigError> {
        let grammar = match &self.grammar_file {
            Some(path) => GrammarDefinition::from_source(read_file(path)?),
            None => GrammarDefinition::structured_text(),
        };

        let theme = match &self.theme_file {
            Some(path) => ThemeDefinition::TmTheme(read_file(path)?.into()),
            None => ThemeDefinition::Builtin(self.theme.clone()),
        };

        let backend: Arc<dyn BackendLoader> = match &self.backend_dump {
            Some(path) => Arc::new(DumpFileBackend::new(path)),
            None => Arc::new(EmbeddedBackend),
        };

        Ok(HighlighterSettings {
            grammar,
            theme,
            backend,
            max_consecutive_failures: self.max_consecutive_failures,
        })
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
