//! # Folio Editor
//!
//! Document engine behind the report editing surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ generator: request → raw report text        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ streaming: reveal raw text tick by tick     │
//! │  - format each revealed prefix              │
//! │  - one session at a time, cancellable       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ versions: live document + history           │
//! │  - initial snapshot, autosave, restore      │
//! │  - commands re-derive the document          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ compiler-html: document → styled surface    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Document is source of truth**: the rendered surface is a derived view
//! 2. **Surface reads back losslessly**: `read_surface(render_html(d)) == d`
//! 3. **History is append-only**: restoring never mutates or deletes a version
//! 4. **Every timer is owned**: streaming and autosave run as cancellable tasks
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{CommandKind, EditorConfig, MemoryVersionStore, ReportSession, SelectionRange};
//!
//! let session = ReportSession::new(generator, Arc::new(MemoryVersionStore::new()), EditorConfig::default());
//! let document = session.generate(&request).await?;
//!
//! session.apply_command(CommandKind::Bold, SelectionRange::new(0, 7), &mut NoPrompt)?;
//! session.controller().save_version(Some("Reviewed".into())).await?;
//! ```

mod collaborators;
mod commands;
mod config;
mod errors;
mod pipeline;
mod scheduler;
mod session;
mod store;
mod streaming;
mod versions;

pub use collaborators::{
    ChartError, ChartImage, ChartRenderer, ChartRequest, ChartType, GenerationError, GenerationRequest,
    ReportGenerator, ReportType,
};
pub use commands::{
    Command, CommandError, CommandKind, NoPrompt, Prompt, SelectionRange, CHART_PROMPT, SOURCE_PROMPT,
};
pub use config::{EditorConfig, DEFAULT_AUTOSAVE_DELAY, DEFAULT_STREAM_TICK};
pub use errors::EditorError;
pub use pipeline::{format, format_to_html, rederive, render, render_html, StyledContent};
pub use scheduler::{Debouncer, ScheduledTask};
pub use session::{LoadMode, ReportSession};
pub use store::{MemoryVersionStore, NewVersion, StoreError, Version, VersionStore};
pub use streaming::{StreamDisplay, StreamFrame, StreamHandle, StreamState, StreamingRenderer, StreamingSession};
pub use versions::{autosave_name, VersionController, INITIAL_VERSION_NAME, SAVE_PROMPT};

// Re-export common types for convenience
pub use folio_compiler_html::{export_document, ExportOptions, SurfaceError};
pub use folio_parser::Document;
