//! Static grammar and theme definitions handed to the highlighter at
//! construction time.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxDefinition;

use crate::error::ConstructionError;

const STRUCTURED_TEXT: &str = include_str!("grammars/structured-text.sublime-syntax");

/// Theme used when nothing else is configured. Light, GitHub-like.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// A `.sublime-syntax` grammar source.
#[derive(Debug, Clone)]
pub struct GrammarDefinition {
    source: Arc<str>,
}

impl GrammarDefinition {
    /// The bundled IEC 61131-3 Structured Text grammar.
    pub fn structured_text() -> Self {
        Self::from_source(STRUCTURED_TEXT)
    }

    pub fn from_source(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::from_source(source))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parse the grammar. Newline-terminated lines are assumed, matching the
    /// bundled syntaxes it is registered alongside.
    pub(crate) fn parse(&self) -> Result<SyntaxDefinition, ConstructionError> {
        SyntaxDefinition::load_from_str(&self.source, true, None)
            .map_err(|e| ConstructionError::Grammar(e.to_string()))
    }
}

impl Default for GrammarDefinition {
    fn default() -> Self {
        Self::structured_text()
    }
}

#[derive(Debug, Clone)]
pub enum ThemeDefinition {
    /// One of the themes bundled with syntect, by name.
    Builtin(String),
    /// Contents of a `.tmTheme` file.
    TmTheme(Arc<str>),
}

impl ThemeDefinition {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let source = std::fs::read_to_string(path)?;
        Ok(ThemeDefinition::TmTheme(source.into()))
    }

    pub(crate) fn resolve(&self) -> Result<Theme, ConstructionError> {
        match self {
            ThemeDefinition::Builtin(name) => {
                let mut themes = ThemeSet::load_defaults().themes;
                themes.remove(name).ok_or_else(|| {
                    ConstructionError::Theme(format!("unknown builtin theme '{}'", name))
                })
            }
            ThemeDefinition::TmTheme(source) => {
                let mut reader = Cursor::new(source.as_bytes());
                ThemeSet::load_from_reader(&mut reader)
                    .map_err(|e| ConstructionError::Theme(e.to_string()))
            }
        }
    }
}

impl Default for ThemeDefinition {
    fn default() -> Self {
        ThemeDefinition::Builtin(DEFAULT_THEME.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_grammar_parses() {
        let syntax = GrammarDefinition::structured_text().parse().unwrap();
        assert_eq!(syntax.name, "Structured Text");
        assert_eq!(syntax.scope.to_string(), "source.st");
        assert!(syntax.file_extensions.iter().any(|ext| ext == "st"));
    }

    #[test]
    fn malformed_grammar_is_a_construction_error() {
        let grammar = GrammarDefinition::from_source("name: [unterminated");
        assert!(matches!(grammar.parse(), Err(ConstructionError::Grammar(_))));
    }

    #[test]
    fn default_theme_is_builtin() {
        let theme = ThemeDefinition::default().resolve().unwrap();
        assert!(theme.settings.background.is_some());
    }

    #[test]
    fn unknown_builtin_theme_fails() {
        let theme = ThemeDefinition::Builtin("no-such-theme".into());
        assert!(matches!(theme.resolve(), Err(ConstructionError::Theme(_))));
    }

    #[test]
    fn garbage_tmtheme_fails() {
        let theme = ThemeDefinition::TmTheme("not a plist".into());
        assert!(matches!(theme.resolve(), Err(ConstructionError::Theme(_))));
    }
}
