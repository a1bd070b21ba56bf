//! # Version Controller
//!
//! Owns the live document and its append-only version history.
//!
//! ## Rules
//!
//! - Every content change re-arms a single autosave timer
//! - Saving an empty or unset document is a no-op
//! - Restoring replaces the live content verbatim and never creates a version
//! - Saves run one at a time; the document lock is never held across I/O
//! - Store failures are recorded in `last_error` and returned; nothing retries

use crate::commands::{Command, CommandError, CommandKind, Prompt, SelectionRange};
use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::pipeline::{format, rederive, render_html};
use crate::scheduler::Debouncer;
use crate::store::{NewVersion, Version, VersionStore};
use chrono::{DateTime, Local};
use folio_compiler_html::{export_document, read_surface, ExportOptions};
use folio_parser::Document;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

pub const INITIAL_VERSION_NAME: &str = "Initial Version";
pub const SAVE_PROMPT: &str = "Enter a name for this version:";

pub fn autosave_name(at: DateTime<Local>) -> String {
    format!("Autosave at {}", at.format("%H:%M:%S"))
}

#[derive(Default)]
struct ControllerState {
    document: Option<Document>,
    /// Rendered surface of the live document
    content: String,
    versions: Vec<Version>,
    last_error: Option<String>,
}

struct ControllerInner {
    store: Arc<dyn VersionStore>,
    config: EditorConfig,
    state: Mutex<ControllerState>,
    save_gate: tokio::sync::Mutex<()>,
    autosave: Debouncer,
}

/// Cloneable handle; clones share one document and history
#[derive(Clone)]
pub struct VersionController {
    inner: Arc<ControllerInner>,
}

impl VersionController {
    pub fn new(store: Arc<dyn VersionStore>, config: EditorConfig) -> Self {
        let autosave = Debouncer::new(config.autosave_delay);
        Self {
            inner: Arc::new(ControllerInner {
                store,
                config,
                state: Mutex::new(ControllerState::default()),
                save_gate: tokio::sync::Mutex::new(()),
                autosave,
            }),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.inner.config
    }

    /// Fetch the history from the store. On failure the cached list is kept.
    pub async fn load_versions(&self) -> Result<Vec<Version>, EditorError> {
        if !self.inner.config.version_control {
            return Ok(self.versions());
        }

        match self.inner.store.list().await {
            Ok(versions) => {
                info!(count = versions.len(), "versions loaded");
                let mut state = self.inner.state.lock();
                state.versions = versions.clone();
                state.last_error = None;
                Ok(versions)
            }
            Err(err) => {
                warn!(error = %err, "failed to load versions");
                self.record_error(format!("Failed to load versions: {}", err));
                Err(err.into())
            }
        }
    }

    /// Snapshot the current content. `Ok(None)` when there is nothing to save.
    pub async fn save_version(&self, name: Option<String>) -> Result<Option<Version>, EditorError> {
        if !self.inner.config.version_control {
            return Ok(None);
        }

        let _gate = self.inner.save_gate.lock().await;

        let request = {
            let state = self.inner.state.lock();
            let has_content = state
                .document
                .as_ref()
                .map(|document| !document.is_empty())
                .unwrap_or(false);
            if !has_content {
                debug!("nothing to save");
                return Ok(None);
            }
            NewVersion::new(state.content.clone(), name)
        };

        match self.inner.store.create(request).await {
            Ok(version) => {
                info!(id = %version.id, name = ?version.name, "version saved");
                let mut state = self.inner.state.lock();
                state.versions.push(version.clone());
                state.last_error = None;
                Ok(Some(version))
            }
            Err(err) => {
                warn!(error = %err, "failed to save version");
                self.record_error(format!("Failed to save version: {}", err));
                Err(err.into())
            }
        }
    }

    /// Ask for a name and save under it. A dismissed or blank name abandons
    /// the save.
    pub async fn manual_save<P>(&self, prompt: &mut P) -> Result<Option<Version>, EditorError>
    where
        P: Prompt + ?Sized,
    {
        let name = prompt
            .ask(SAVE_PROMPT)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        match name {
            Some(name) => self.save_version(Some(name)).await,
            None => {
                debug!("manual save dismissed");
                Ok(None)
            }
        }
    }

    /// Replace the live content with a stored version and re-arm autosave.
    /// Returns false when the id is unknown.
    pub fn restore_version(&self, id: &str) -> bool {
        let mut state = self.inner.state.lock();
        let Some(version) = state.versions.iter().find(|version| version.id == id).cloned() else {
            debug!(id, "restore of unknown version ignored");
            return false;
        };

        state.document = Some(format(&version.content));
        state.content = version.content;
        drop(state);

        self.schedule_autosave();
        info!(id, "version restored");
        true
    }

    /// Install the first formatted result of a generation, snapshot it as
    /// the initial version if the history is still empty, then arm autosave.
    pub async fn capture_initial(&self, document: Document) -> Result<Option<Version>, EditorError> {
        self.set_document(document);

        let has_versions = !self.inner.state.lock().versions.is_empty();
        let saved = if has_versions || !self.inner.config.version_control {
            Ok(None)
        } else {
            self.save_version(Some(INITIAL_VERSION_NAME.to_string())).await
        };

        self.schedule_autosave();
        saved
    }

    /// Replace the live document wholesale and arm autosave
    pub fn replace_document(&self, document: Document) {
        self.set_document(document);
        self.schedule_autosave();
    }

    /// Take the editing surface's markup as the new live content
    pub fn update_from_surface(&self, html: &str) -> Result<Document, EditorError> {
        let document = read_surface(html)?;
        let changed = {
            let state = self.inner.state.lock();
            state.document.as_ref() != Some(&document)
        };

        if changed {
            self.replace_document(document.clone());
        }
        Ok(document)
    }

    /// Apply a command to the live document, re-derive the canonical
    /// document from the rendered surface and arm autosave.
    pub fn apply_command(
        &self,
        kind: CommandKind,
        selection: SelectionRange,
        prompt: &mut dyn Prompt,
    ) -> Result<Document, EditorError> {
        let current = self.document().ok_or(CommandError::NoDocument)?;

        let edited = Command::new(kind, selection).apply(&current, prompt)?;
        let document = rederive(&edited)?;
        debug!(command = kind.name(), nodes = document.len(), "command applied");

        self.replace_document(document.clone());
        Ok(document)
    }

    /// Standalone HTML of the current content. Read only.
    pub fn export(&self) -> Vec<u8> {
        self.export_with(&ExportOptions::default())
    }

    pub fn export_with(&self, options: &ExportOptions) -> Vec<u8> {
        let content = self.content();
        export_document(&content, options).into_bytes()
    }

    pub fn versions(&self) -> Vec<Version> {
        self.inner.state.lock().versions.clone()
    }

    pub fn document(&self) -> Option<Document> {
        self.inner.state.lock().document.clone()
    }

    pub fn content(&self) -> String {
        self.inner.state.lock().content.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.state.lock().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.inner.state.lock().last_error = None;
    }

    pub fn has_pending_autosave(&self) -> bool {
        self.inner.autosave.is_pending()
    }

    pub fn cancel_autosave(&self) {
        self.inner.autosave.cancel();
    }

    /// Cancel pending timers
    pub fn shutdown(&self) {
        debug!("version controller shutting down");
        self.cancel_autosave();
    }

    fn set_document(&self, document: Document) {
        let content = render_html(&document);
        let mut state = self.inner.state.lock();
        state.document = Some(document);
        state.content = content;
    }

    fn record_error(&self, message: String) {
        self.inner.state.lock().last_error = Some(message);
    }

    fn schedule_autosave(&self) {
        if !self.inner.config.version_control {
            return;
        }

        let weak: Weak<ControllerInner> = Arc::downgrade(&self.inner);
        self.inner.autosave.schedule(async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let controller = VersionController { inner };
            // failures are already recorded in last_error
            let _ = controller.save_version(Some(autosave_name(Local::now()))).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryVersionStore;
    use chrono::TimeZone;
    use folio_parser::parse;

    fn controller() -> VersionController {
        VersionController::new(Arc::new(MemoryVersionStore::new()), EditorConfig::default())
    }

    #[test]
    fn test_autosave_name_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap();
        assert_eq!(autosave_name(at), "Autosave at 07:05:03");
    }

    #[tokio::test]
    async fn test_capture_initial_saves_once() {
        let controller = controller();
        let first = controller.capture_initial(parse("# Report")).await.unwrap();
        assert_eq!(first.unwrap().name.as_deref(), Some(INITIAL_VERSION_NAME));

        let second = controller.capture_initial(parse("# Again")).await.unwrap();
        assert!(second.is_none());
        assert_eq!(controller.versions().len(), 1);
        assert!(controller.has_pending_autosave());
        controller.shutdown();
    }

    #[tokio::test]
    async fn test_restore_unknown_id_is_noop() {
        let controller = controller();
        controller.capture_initial(parse("Text")).await.unwrap();
        let before = controller.content();

        controller.cancel_autosave();

        assert!(!controller.restore_version("missing"));
        assert_eq!(controller.content(), before);
        assert!(!controller.has_pending_autosave());
    }

    #[tokio::test]
    async fn test_apply_command_without_document() {
        let controller = controller();
        let result = controller.apply_command(
            CommandKind::Bold,
            SelectionRange::new(0, 1),
            &mut crate::commands::NoPrompt,
        );
        assert_eq!(result, Err(EditorError::Command(CommandError::NoDocument)));
    }

    #[tokio::test]
    async fn test_manual_save_dismissed() {
        let controller = controller();
        controller.replace_document(parse("Text"));

        let mut dismiss = |_: &str| -> Option<String> { None };
        assert_eq!(controller.manual_save(&mut dismiss).await, Ok(None));
        assert!(controller.versions().is_empty());
        controller.shutdown();
    }
}
