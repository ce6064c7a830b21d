use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::error::ConstructionError;
use crate::highlighter::{Highlighter, HighlighterManager};
use crate::host::HostGlobal;
use crate::shim::WorkerShim;

/// Owns the code-presentation state for the lifetime of the application.
///
/// Build one at startup and share it with every page that renders code or
/// mounts the editor.
pub struct Presentation {
    highlighter: Arc<HighlighterManager>,
    shim: WorkerShim,
}

impl Presentation {
    pub fn new(highlighter: HighlighterManager, shim: WorkerShim) -> Self {
        Self {
            highlighter: Arc::new(highlighter),
            shim,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let settings = config.highlighter.settings()?;
        Ok(Self::new(
            HighlighterManager::new(settings),
            WorkerShim::new(config.shim.clone()),
        ))
    }

    pub fn highlighter(&self) -> &Arc<HighlighterManager> {
        &self.highlighter
    }

    pub fn shim(&self) -> &WorkerShim {
        &self.shim
    }

    pub async fn acquire(&self) -> Result<Arc<Highlighter>, ConstructionError> {
        self.highlighter.acquire().await
    }

    pub fn mount_editor(&self, host: &HostGlobal) {
        self.shim.install(host);
    }

    pub fn unmount_editor(&self, host: &HostGlobal) {
        self.shim.uninstall(host);
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new(HighlighterManager::default(), WorkerShim::default())
    }
}
