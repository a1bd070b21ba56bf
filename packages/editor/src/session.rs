//! # Report Session
//!
//! One user's report from generation to editing.
//!
//! A ReportSession owns the streaming renderer and the version controller
//! for a single document, and talks to the report generator on the user's
//! behalf. Shutting the session down (or dropping it) cancels the stream,
//! the autosave timer and any generation still in flight.

use crate::collaborators::{GenerationRequest, ReportGenerator};
use crate::commands::{CommandKind, Prompt, SelectionRange};
use crate::config::EditorConfig;
use crate::errors::EditorError;
use crate::pipeline::format;
use crate::store::VersionStore;
use crate::streaming::{StreamDisplay, StreamingRenderer};
use crate::versions::VersionController;
use folio_parser::Document;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How generated text reaches the live document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Reveal the text through the streaming renderer
    #[default]
    Stream,
    /// Format the whole text at once
    Immediate,
}

pub struct ReportSession {
    /// Unique session identifier
    id: String,
    generator: Arc<dyn ReportGenerator>,
    renderer: StreamingRenderer,
    controller: VersionController,
    mode: LoadMode,
    closed: CancellationToken,
}

impl ReportSession {
    pub fn new(
        generator: Arc<dyn ReportGenerator>,
        store: Arc<dyn VersionStore>,
        config: EditorConfig,
    ) -> Self {
        let renderer = StreamingRenderer::new(config.stream_tick);
        let controller = VersionController::new(store, config);
        Self {
            id: Uuid::new_v4().to_string(),
            generator,
            renderer,
            controller,
            mode: LoadMode::default(),
            closed: CancellationToken::new(),
        }
    }

    pub fn with_mode(mut self, mode: LoadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> LoadMode {
        self.mode
    }

    pub fn controller(&self) -> &VersionController {
        &self.controller
    }

    pub fn renderer(&self) -> &StreamingRenderer {
        &self.renderer
    }

    /// Frames of the stream in progress
    pub fn subscribe(&self) -> watch::Receiver<StreamDisplay> {
        self.renderer.subscribe()
    }

    /// Ask the generator for a report and load it.
    ///
    /// Returns `Ok(None)` when the session was shut down or a newer load
    /// superseded this one before the text was fully revealed.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Option<Document>, EditorError> {
        request.validate()?;
        info!(
            session = %self.id,
            model = %request.selected_model,
            report_type = ?request.report_type,
            "generating report"
        );

        let raw = tokio::select! {
            _ = self.closed.cancelled() => {
                debug!(session = %self.id, "generation abandoned");
                return Ok(None);
            }
            result = self.generator.generate(request) => result,
        };

        match raw {
            Ok(raw) => self.load_raw(raw).await,
            Err(err) => {
                warn!(session = %self.id, error = %err, "report generation failed");
                Err(err.into())
            }
        }
    }

    /// Load ready-made raw text as the session's document
    pub async fn load_raw(&self, raw: impl Into<String>) -> Result<Option<Document>, EditorError> {
        if self.closed.is_cancelled() {
            return Ok(None);
        }
        self.controller.cancel_autosave();

        let raw = raw.into();
        let document = match self.mode {
            LoadMode::Immediate => format(&raw),
            LoadMode::Stream => match self.renderer.start(raw).finished().await {
                Some(document) => document,
                None => {
                    debug!(session = %self.id, "stream ended without a document");
                    return Ok(None);
                }
            },
        };

        // store failures are recorded in last_error; the document still loads
        let _ = self.controller.capture_initial(document.clone()).await;
        Ok(Some(document))
    }

    pub fn apply_command(
        &self,
        kind: CommandKind,
        selection: SelectionRange,
        prompt: &mut dyn Prompt,
    ) -> Result<Document, EditorError> {
        self.controller.apply_command(kind, selection, prompt)
    }

    pub fn update_from_surface(&self, html: &str) -> Result<Document, EditorError> {
        self.controller.update_from_surface(html)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Cancel the stream, the autosave timer and any pending generation
    pub fn shutdown(&self) {
        if self.closed.is_cancelled() {
            return;
        }
        self.closed.cancel();
        self.renderer.cancel();
        self.controller.shutdown();
        info!(session = %self.id, "report session closed");
    }
}

impl Drop for ReportSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::GenerationError;
    use crate::store::MemoryVersionStore;
    use crate::versions::INITIAL_VERSION_NAME;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGenerator {
        output: Result<String, GenerationError>,
        calls: AtomicUsize,
    }

    impl FixedGenerator {
        fn new(output: Result<String, GenerationError>) -> Arc<Self> {
            Arc::new(Self {
                output,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ReportGenerator for FixedGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output.clone()
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("Quarterly summary", "gpt-4")
    }

    #[tokio::test]
    async fn test_immediate_load_captures_initial_version() {
        let generator = FixedGenerator::new(Ok("# Summary\nRevenue grew.".to_string()));
        let session = ReportSession::new(generator, Arc::new(MemoryVersionStore::new()), EditorConfig::default())
            .with_mode(LoadMode::Immediate);

        let document = session.generate(&request()).await.unwrap().unwrap();
        assert_eq!(document, format("# Summary\nRevenue grew."));

        let versions = session.controller().versions();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].name.as_deref(), Some(INITIAL_VERSION_NAME));
        assert_eq!(versions[0].content, session.controller().content());
    }

    #[tokio::test(start_paused = true)]
    async fn test_streamed_load_matches_format() {
        let raw = "[High Confidence] Margins improved";
        let generator = FixedGenerator::new(Ok(raw.to_string()));
        let session = ReportSession::new(generator, Arc::new(MemoryVersionStore::new()), EditorConfig::default());

        let document = session.generate(&request()).await.unwrap().unwrap();
        assert_eq!(document, format(raw));
        assert_eq!(session.controller().document(), Some(document));
        assert_eq!(session.controller().versions().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_generator() {
        let generator = FixedGenerator::new(Ok("text".to_string()));
        let session = ReportSession::new(
            generator.clone(),
            Arc::new(MemoryVersionStore::new()),
            EditorConfig::default(),
        );

        let result = session.generate(&GenerationRequest::new("", "gpt-4")).await;
        assert!(matches!(result, Err(EditorError::Generation(GenerationError::InvalidRequest(_)))));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_session_empty() {
        let generator = FixedGenerator::new(Err(GenerationError::Unavailable("offline".to_string())));
        let session = ReportSession::new(generator, Arc::new(MemoryVersionStore::new()), EditorConfig::default());

        let result = session.generate(&request()).await;
        assert_eq!(
            result,
            Err(EditorError::Generation(GenerationError::Unavailable("offline".to_string())))
        );
        assert!(session.controller().document().is_none());
        assert!(session.controller().versions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_discards_stream() {
        let generator = FixedGenerator::new(Ok("unused".to_string()));
        let session = Arc::new(ReportSession::new(
            generator,
            Arc::new(MemoryVersionStore::new()),
            EditorConfig::default(),
        ));

        let loading = {
            let session = session.clone();
            tokio::spawn(async move { session.load_raw("A long enough report body").await })
        };
        tokio::time::sleep(crate::config::DEFAULT_STREAM_TICK * 3).await;
        session.shutdown();

        assert_eq!(loading.await.unwrap(), Ok(None));
        assert!(session.is_closed());
        assert!(session.controller().versions().is_empty());
        assert_eq!(session.load_raw("more").await, Ok(None));
    }
}
