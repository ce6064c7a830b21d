pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod grammar;
pub mod highlighter;
pub mod host;
pub mod presentation;
pub mod render;
pub mod shim;

// Re-export main types
pub use backend::{BackendLoader, DumpFileBackend, EmbeddedBackend};
pub use config::{Config, ConfigError};
pub use diagnostics::{DiagnosticFilter, DiagnosticSink, DiagnosticSinks, SuppressionPatterns};
pub use error::{ConstructionError, HighlightError};
pub use grammar::{GrammarDefinition, ThemeDefinition};
pub use highlighter::{Highlighter, HighlighterManager, HighlighterSettings};
pub use host::{ExecutionContext, HostGlobal};
pub use presentation::Presentation;
pub use render::{render_code_block, render_markdown};
pub use shim::{ShimSettings, WorkerEnvironment, WorkerShim};
