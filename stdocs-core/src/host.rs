//! The host global object the embedded editor probes at mount time.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::diagnostics::DiagnosticSinks;
use crate::shim::WorkerEnvironment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// A page with a global environment the editor can probe.
    Browser,
    /// Server-side rendering; no global environment.
    Server,
}

#[derive(Debug)]
struct GlobalState {
    worker_environment: Option<Arc<WorkerEnvironment>>,
    diagnostics: DiagnosticSinks,
    saved_diagnostics: Option<DiagnosticSinks>,
    shim_installed: bool,
}

#[derive(Debug)]
pub struct HostGlobal {
    context: ExecutionContext,
    state: Mutex<GlobalState>,
}

impl HostGlobal {
    pub fn new(context: ExecutionContext, diagnostics: DiagnosticSinks) -> Self {
        Self {
            context,
            state: Mutex::new(GlobalState {
                worker_environment: None,
                diagnostics,
                saved_diagnostics: None,
                shim_installed: false,
            }),
        }
    }

    pub fn browser(diagnostics: DiagnosticSinks) -> Self {
        Self::new(ExecutionContext::Browser, diagnostics)
    }

    pub fn server() -> Self {
        Self::new(ExecutionContext::Server, DiagnosticSinks::tracing())
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    pub fn is_browser(&self) -> bool {
        self.context == ExecutionContext::Browser
    }

    pub fn worker_environment(&self) -> Option<Arc<WorkerEnvironment>> {
        self.state.lock().worker_environment.clone()
    }

    /// The sinks currently receiving diagnostics.
    pub fn diagnostics(&self) -> DiagnosticSinks {
        self.state.lock().diagnostics.clone()
    }

    pub fn set_diagnostics(&self, sinks: DiagnosticSinks) {
        self.state.lock().diagnostics = sinks;
    }

    pub fn shim_installed(&self) -> bool {
        self.state.lock().shim_installed
    }

    pub fn has_saved_diagnostics(&self) -> bool {
        self.state.lock().saved_diagnostics.is_some()
    }

    /// Report an error-level diagnostic.
    pub fn error(&self, args: &[&str]) {
        // Clone out so a sink may touch the host without deadlocking.
        let sink = Arc::clone(&self.state.lock().diagnostics.error);
        sink.emit(args);
    }

    /// Report a warning-level diagnostic.
    pub fn warn(&self, args: &[&str]) {
        let sink = Arc::clone(&self.state.lock().diagnostics.warn);
        sink.emit(args);
    }

    /// Publish the worker environment, wrap the diagnostics and record the
    /// originals, all under one lock. Returns false if already installed.
    pub(crate) fn install_shim(
        &self,
        environment: Arc<WorkerEnvironment>,
        wrap: impl FnOnce(&DiagnosticSinks) -> DiagnosticSinks,
    ) -> bool {
        let mut state = self.state.lock();
        if state.shim_installed {
            return false;
        }

        let originals = state.diagnostics.clone();
        state.diagnostics = wrap(&originals);
        state.saved_diagnostics = Some(originals);
        state.worker_environment = Some(environment);
        state.shim_installed = true;
        true
    }

    /// Restore the saved diagnostics. Returns false if nothing was saved.
    pub(crate) fn uninstall_shim(&self) -> bool {
        let mut state = self.state.lock();
        let Some(originals) = state.saved_diagnostics.take() else {
            return false;
        };

        state.diagnostics = originals;
        state.worker_environment = None;
        state.shim_installed = false;
        true
    }
}

impl Default for HostGlobal {
    fn default() -> Self {
        Self::server()
    }
}
