//! Worker-environment shim for the embedded code editor.
//!
//! The editor expects to spawn background workers and fetch their scripts
//! (plus source maps) when it mounts. No worker runtime is provisioned for
//! the documentation pages, so [`WorkerShim::install`] publishes a
//! [`WorkerEnvironment`] whose workers do nothing, and filters the resulting
//! load noise out of the host's diagnostics. Nothing here ever runs in the
//! background.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::diagnostics::{DiagnosticFilter, SuppressionPatterns};
use crate::host::HostGlobal;

pub const DEFAULT_BASE_URL: &str = "/node_modules/monaco-editor/min/";

pub type Listener = Box<dyn Fn(&Value) + Send + Sync>;

/// Creates a trusted-types policy by name.
pub type TrustedTypesPolicyFactory = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// What the editor can do with a background worker.
pub trait Worker: Send {
    fn post_message(&self, message: Value);
    fn add_event_listener(&mut self, kind: &str, listener: Listener);
    fn remove_event_listener(&mut self, kind: &str);
    fn terminate(&mut self);
}

pub trait WorkerFactory: Send + Sync {
    fn create_worker(&self, module_id: &str, label: &str) -> Box<dyn Worker>;
    fn worker_url(&self, module_id: &str, label: &str) -> String;
}

/// A worker that accepts everything and does nothing. Listeners are
/// dropped, never called.
#[derive(Debug, Default, Clone, Copy)]
pub struct InertWorker;

impl Worker for InertWorker {
    fn post_message(&self, _message: Value) {}

    fn add_event_listener(&mut self, _kind: &str, _listener: Listener) {}

    fn remove_event_listener(&mut self, _kind: &str) {}

    fn terminate(&mut self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct InertWorkerFactory;

impl WorkerFactory for InertWorkerFactory {
    fn create_worker(&self, module_id: &str, label: &str) -> Box<dyn Worker> {
        debug!(module_id, label, "handing out inert worker");
        Box::new(InertWorker)
    }

    /// Empty, so no worker script is ever fetched.
    fn worker_url(&self, _module_id: &str, _label: &str) -> String {
        String::new()
    }
}

/// The environment descriptor the editor looks up on the host global.
pub struct WorkerEnvironment {
    factory: Arc<dyn WorkerFactory>,
    trusted_types_policy: Option<TrustedTypesPolicyFactory>,
    base_url: String,
    global_api: bool,
}

impl WorkerEnvironment {
    pub fn create_worker(&self, module_id: &str, label: &str) -> Box<dyn Worker> {
        self.factory.create_worker(module_id, label)
    }

    pub fn worker_url(&self, module_id: &str, label: &str) -> String {
        self.factory.worker_url(module_id, label)
    }

    pub fn trusted_types_policy(&self) -> Option<&TrustedTypesPolicyFactory> {
        self.trusted_types_policy.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the editor may discover and load its global API helpers.
    pub fn global_api(&self) -> bool {
        self.global_api
    }

    pub fn descriptor(&self) -> EnvironmentDescriptor {
        EnvironmentDescriptor {
            base_url: self.base_url.clone(),
            global_api: self.global_api,
            worker_url: self.worker_url("", ""),
            trusted_types_policy: self.trusted_types_policy.is_some(),
        }
    }
}

impl std::fmt::Debug for WorkerEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerEnvironment")
            .field("base_url", &self.base_url)
            .field("global_api", &self.global_api)
            .field("trusted_types_policy", &self.trusted_types_policy.is_some())
            .finish_non_exhaustive()
    }
}

/// Serializable view of a [`WorkerEnvironment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDescriptor {
    pub base_url: String,
    #[serde(rename = "globalAPI")]
    pub global_api: bool,
    pub worker_url: String,
    pub trusted_types_policy: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShimSettings {
    pub base_url: String,
    pub global_api: bool,
    pub suppressed_patterns: SuppressionPatterns,
}

impl Default for ShimSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            global_api: false,
            suppressed_patterns: SuppressionPatterns::default(),
        }
    }
}

pub struct WorkerShim {
    settings: ShimSettings,
    filter: Arc<dyn DiagnosticFilter>,
}

impl WorkerShim {
    pub fn new(settings: ShimSettings) -> Self {
        let filter = Arc::new(settings.suppressed_patterns.clone());
        Self { settings, filter }
    }

    /// Use `filter` instead of the configured suppression patterns.
    pub fn with_filter(settings: ShimSettings, filter: Arc<dyn DiagnosticFilter>) -> Self {
        Self { settings, filter }
    }

    pub fn settings(&self) -> &ShimSettings {
        &self.settings
    }

    pub fn environment(&self) -> WorkerEnvironment {
        WorkerEnvironment {
            factory: Arc::new(InertWorkerFactory),
            trusted_types_policy: None,
            base_url: self.settings.base_url.clone(),
            global_api: self.settings.global_api,
        }
    }

    /// Install the fake worker environment and diagnostics filter on `host`.
    ///
    /// Call before mounting the editor. Does nothing when already installed
    /// or when `host` is not a browser context.
    pub fn install(&self, host: &HostGlobal) {
        if !host.is_browser() {
            debug!("no browser context, skipping worker shim");
            return;
        }

        let environment = Arc::new(self.environment());
        let filter = Arc::clone(&self.filter);
        if host.install_shim(environment, |sinks| sinks.filtered(filter)) {
            info!(base_url = %self.settings.base_url, "worker shim installed");
        } else {
            debug!("worker shim already installed");
        }
    }

    /// Restore the diagnostics that were in place before [`install`].
    ///
    /// [`install`]: WorkerShim::install
    pub fn uninstall(&self, host: &HostGlobal) {
        if !host.is_browser() {
            return;
        }

        if host.uninstall_shim() {
            info!("worker shim removed");
        }
    }
}

impl Default for WorkerShim {
    fn default() -> Self {
        Self::new(ShimSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::diagnostics::DiagnosticSinks;
    use crate::diagnostics::tests::RecordingSink;

    struct Host {
        global: HostGlobal,
        errors: Arc<RecordingSink>,
        warnings: Arc<RecordingSink>,
        originals: DiagnosticSinks,
    }

    fn browser_host() -> Host {
        let errors = Arc::new(RecordingSink::default());
        let warnings = Arc::new(RecordingSink::default());
        let originals = DiagnosticSinks::new(errors.clone(), warnings.clone());
        Host {
            global: HostGlobal::browser(originals.clone()),
            errors,
            warnings,
            originals,
        }
    }

    #[test]
    fn install_publishes_inert_environment() {
        let host = browser_host();
        WorkerShim::default().install(&host.global);

        assert!(host.global.shim_installed());
        let env = host.global.worker_environment().unwrap();
        assert_eq!(env.worker_url("vs/editor/editor.worker", "editorWorkerService"), "");
        assert!(env.trusted_types_policy().is_none());
        assert_eq!(env.base_url(), DEFAULT_BASE_URL);
        assert!(!env.global_api());
    }

    #[test]
    fn inert_worker_never_calls_listeners() {
        let host = browser_host();
        WorkerShim::default().install(&host.global);
        let env = host.global.worker_environment().unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let mut worker = env.create_worker("vs/language/typescript/ts.worker", "typescript");
        let seen = Arc::clone(&calls);
        worker.add_event_listener(
            "message",
            Box::new(move |_: &Value| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );
        worker.post_message(json!({ "method": "getSemanticDiagnostics" }));
        worker.remove_event_listener("message");
        worker.terminate();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn suppressed_messages_are_dropped_and_others_pass_once() {
        let host = browser_host();
        WorkerShim::default().install(&host.global);

        host.global.error(&["Could not load worker", "editor.worker.js"]);
        host.global.warn(&["DevTools failed to load source map: marked.umd.js.map"]);
        host.global.error(&["TypeError:", "x is undefined"]);
        host.global.warn(&["deprecated option", "wordWrap"]);

        assert_eq!(
            host.errors.calls(),
            vec![vec!["TypeError:".to_string(), "x is undefined".to_string()]]
        );
        assert_eq!(
            host.warnings.calls(),
            vec![vec!["deprecated option".to_string(), "wordWrap".to_string()]]
        );
    }

    #[test]
    fn second_install_changes_nothing() {
        let host = browser_host();
        let shim = WorkerShim::default();

        shim.install(&host.global);
        let env = host.global.worker_environment().unwrap();
        let wrapped = host.global.diagnostics();

        shim.install(&host.global);
        assert!(Arc::ptr_eq(&env, &host.global.worker_environment().unwrap()));
        assert!(wrapped.same_as(&host.global.diagnostics()));

        host.global.error(&["net::ERR_ABORTED 404 (Not Found)"]);
        host.global.error(&["real problem"]);
        assert_eq!(host.errors.calls(), vec![vec!["real problem".to_string()]]);
    }

    #[test]
    fn uninstall_restores_original_sinks() {
        let host = browser_host();
        let shim = WorkerShim::default();

        shim.install(&host.global);
        assert!(!host.global.diagnostics().same_as(&host.originals));
        assert!(host.global.has_saved_diagnostics());

        shim.uninstall(&host.global);
        assert!(host.global.diagnostics().same_as(&host.originals));
        assert!(!host.global.has_saved_diagnostics());
        assert!(!host.global.shim_installed());
        assert!(host.global.worker_environment().is_none());

        host.global.error(&["Could not load worker"]);
        assert_eq!(host.errors.calls().len(), 1);
    }

    #[test]
    fn uninstall_without_install_is_a_no_op() {
        let host = browser_host();
        let shim = WorkerShim::default();

        shim.uninstall(&host.global);
        shim.uninstall(&host.global);

        assert!(host.global.diagnostics().same_as(&host.originals));
        assert!(!host.global.shim_installed());
    }

    #[test]
    fn reinstall_after_uninstall_wraps_again() {
        let host = browser_host();
        let shim = WorkerShim::default();

        shim.install(&host.global);
        shim.uninstall(&host.global);
        shim.install(&host.global);

        assert!(host.global.shim_installed());
        host.global.warn(&["Refused to load the script 'blob:'"]);
        assert!(host.warnings.calls().is_empty());

        shim.uninstall(&host.global);
        assert!(host.global.diagnostics().same_as(&host.originals));
    }

    #[test]
    fn server_context_is_left_untouched() {
        let host = HostGlobal::server();
        let before = host.diagnostics();
        let shim = WorkerShim::default();

        shim.install(&host);
        assert!(!host.shim_installed());
        assert!(host.worker_environment().is_none());
        assert!(!host.has_saved_diagnostics());
        assert!(host.diagnostics().same_as(&before));

        shim.uninstall(&host);
        assert!(host.diagnostics().same_as(&before));
    }

    #[test]
    fn custom_filter_replaces_patterns() {
        let host = browser_host();
        let shim = WorkerShim::with_filter(
            ShimSettings::default(),
            Arc::new(|m: &str| m.contains("chatty")),
        );
        shim.install(&host.global);

        host.global.error(&["chatty widget"]);
        host.global.error(&["Could not load worker"]);

        assert_eq!(host.errors.calls(), vec![vec!["Could not load worker".to_string()]]);
    }

    #[test]
    fn descriptor_serializes_like_the_editor_expects() {
        let descriptor = WorkerShim::default().environment().descriptor();
        let value = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(
            value,
            json!({
                "baseUrl": DEFAULT_BASE_URL,
                "globalAPI": false,
                "workerUrl": "",
                "trustedTypesPolicy": false,
            })
        );
    }
}
