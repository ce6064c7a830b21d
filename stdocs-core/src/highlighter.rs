//! The process-wide syntax highlighter.
//!
//! Building a highlighter means loading the full syntax set, registering the
//! Structured Text grammar and resolving the theme, which is far too slow to
//! do per code block. [`HighlighterManager`] builds it at most once and hands
//! the same [`Highlighter`] to every caller. Callers that arrive while the
//! build is still running join it instead of starting their own.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::{debug, info, warn};

use crate::backend::{BackendLoader, EmbeddedBackend};
use crate::error::{ConstructionError, HighlightError};
use crate::grammar::{GrammarDefinition, ThemeDefinition};

/// Fence tokens that name the custom grammar but aren't among its file
/// extensions.
const GRAMMAR_ALIASES: &[&str] = &[
    "structured-text",
    "structured_text",
    "structuredtext",
    "iec61131",
    "iec-st",
];

/// Fallbacks for languages the bundled syntaxes lack.
const FALLBACKS: &[(&str, &str)] = &[("toml", "YAML"), ("nix", "JavaScript")];

pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
    language: String,
}

impl Highlighter {
    /// Name of the custom grammar, used when no language is given.
    pub fn language_name(&self) -> &str {
        &self.language
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn syntax_set(&self) -> &SyntaxSet {
        &self.syntax_set
    }

    /// Resolve a fence token, file extension or syntax name.
    pub fn find_language(&self, token: &str) -> Option<&SyntaxReference> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        self.syntax_set
            .find_syntax_by_token(token)
            .or_else(|| {
                let lower = token.to_ascii_lowercase();
                if GRAMMAR_ALIASES.contains(&lower.as_str()) {
                    return self.syntax_set.find_syntax_by_name(&self.language);
                }
                FALLBACKS
                    .iter()
                    .find(|(from, _)| *from == lower)
                    .and_then(|(_, to)| self.syntax_set.find_syntax_by_name(to))
            })
    }

    fn syntax_for(&self, language: Option<&str>) -> Result<&SyntaxReference, HighlightError> {
        let name = language.unwrap_or(&self.language);
        self.find_language(name)
            .ok_or_else(|| HighlightError::UnknownLanguage(name.to_string()))
    }

    /// Render `code` as a `<pre>` block with inline theme styles.
    ///
    /// `None` highlights with the custom grammar.
    pub fn highlight_html(
        &self,
        code: &str,
        language: Option<&str>,
    ) -> Result<String, HighlightError> {
        let syntax = self.syntax_for(language)?;
        Ok(highlighted_html_for_string(code, &self.syntax_set, syntax, &self.theme)?)
    }

    /// Styled spans for each line of `code`.
    pub fn highlight_lines(
        &self,
        code: &str,
        language: Option<&str>,
    ) -> Result<Vec<Vec<(Style, String)>>, HighlightError> {
        let syntax = self.syntax_for(language)?;
        let mut lines = HighlightLines::new(syntax, &self.theme);

        LinesWithEndings::from(code)
            .map(|line| {
                let spans = lines.highlight_line(line, &self.syntax_set)?;
                Ok(spans
                    .into_iter()
                    .map(|(style, text)| (style, text.to_string()))
                    .collect())
            })
            .collect()
    }
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("language", &self.language)
            .field("theme", &self.theme.name)
            .field("syntaxes", &self.syntax_set.syntaxes().len())
            .finish()
    }
}

/// Everything needed to build a [`Highlighter`]. Fixed for the lifetime of a
/// manager.
#[derive(Clone)]
pub struct HighlighterSettings {
    pub grammar: GrammarDefinition,
    pub theme: ThemeDefinition,
    pub backend: Arc<dyn BackendLoader>,
    /// Stop rebuilding after this many failures in a row. `None` retries on
    /// every call.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for HighlighterSettings {
    fn default() -> Self {
        Self {
            grammar: GrammarDefinition::default(),
            theme: ThemeDefinition::default(),
            backend: Arc::new(EmbeddedBackend),
            max_consecutive_failures: None,
        }
    }
}

type Construction = Shared<BoxFuture<'static, Result<Arc<Highlighter>, ConstructionError>>>;

enum Slot {
    Empty,
    Pending(Construction),
    Ready(Arc<Highlighter>),
    Exhausted(ConstructionError),
}

struct State {
    slot: Slot,
    consecutive_failures: u32,
}

pub struct HighlighterManager {
    settings: HighlighterSettings,
    state: Arc<Mutex<State>>,
    attempts: AtomicUsize,
}

impl HighlighterManager {
    pub fn new(settings: HighlighterSettings) -> Self {
        Self {
            settings,
            state: Arc::new(Mutex::new(State {
                slot: Slot::Empty,
                consecutive_failures: 0,
            })),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Get the highlighter, building it on first use.
    ///
    /// Returns immediately once built. Concurrent callers during the build
    /// all receive the result of the same attempt. A failed attempt is
    /// forgotten, so the next call starts over.
    pub async fn acquire(&self) -> Result<Arc<Highlighter>, ConstructionError> {
        let construction = {
            let mut state = self.state.lock();
            match &state.slot {
                Slot::Ready(highlighter) => return Ok(Arc::clone(highlighter)),
                Slot::Exhausted(err) => return Err(err.clone()),
                Slot::Pending(construction) => {
                    debug!("joining pending highlighter construction");
                    construction.clone()
                }
                Slot::Empty => {
                    let construction = self.start_construction();
                    state.slot = Slot::Pending(construction.clone());
                    construction
                }
            }
        };

        construction.await
    }

    /// The highlighter, if it has already been built.
    pub fn get(&self) -> Option<Arc<Highlighter>> {
        match &self.state.lock().slot {
            Slot::Ready(highlighter) => Some(Arc::clone(highlighter)),
            _ => None,
        }
    }

    /// Number of construction attempts started so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn start_construction(&self) -> Construction {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let state = Arc::downgrade(&self.state);
        let backend = Arc::clone(&self.settings.backend);
        let grammar = self.settings.grammar.clone();
        let theme = self.settings.theme.clone();
        let limit = self.settings.max_consecutive_failures;

        async move {
            info!(attempt, "constructing highlighter");
            let result = construct(backend, grammar, theme).await.map(Arc::new);
            publish(&state, &result, limit);
            result
        }
        .boxed()
        .shared()
    }
}

impl Default for HighlighterManager {
    fn default() -> Self {
        Self::new(HighlighterSettings::default())
    }
}

async fn construct(
    backend: Arc<dyn BackendLoader>,
    grammar: GrammarDefinition,
    theme: ThemeDefinition,
) -> Result<Highlighter, ConstructionError> {
    let defaults = backend.load().await?;

    tokio::task::spawn_blocking(move || link(defaults, &grammar, &theme))
        .await
        .map_err(|e| ConstructionError::BackendTask(e.to_string()))?
}

/// Register the grammar into the loaded set and resolve the theme. Relinks
/// every syntax, so it runs off the async executor.
fn link(
    defaults: SyntaxSet,
    grammar: &GrammarDefinition,
    theme: &ThemeDefinition,
) -> Result<Highlighter, ConstructionError> {
    let syntax = grammar.parse()?;
    let language = syntax.name.clone();

    let mut builder = defaults.into_builder();
    builder.add(syntax);
    let syntax_set = builder.build();
    let theme = theme.resolve()?;

    Ok(Highlighter {
        syntax_set,
        theme,
        language,
    })
}

fn publish(
    state: &Weak<Mutex<State>>,
    result: &Result<Arc<Highlighter>, ConstructionError>,
    limit: Option<u32>,
) {
    // Manager dropped mid-build; joined callers still get the result.
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = state.lock();

    match result {
        Ok(highlighter) => {
            info!(?highlighter, "highlighter ready");
            state.consecutive_failures = 0;
            state.slot = Slot::Ready(Arc::clone(highlighter));
        }
        Err(err) => {
            state.consecutive_failures += 1;
            let failures = state.consecutive_failures;
            warn!(error = %err, failures, "highlighter construction failed");

            state.slot = match limit {
                Some(limit) if failures >= limit => {
                    Slot::Exhausted(ConstructionError::Exhausted {
                        attempts: failures,
                        last: Box::new(err.clone()),
                    })
                }
                _ => Slot::Empty,
            };
        }
    }
}
