//! Error types for the editor

use crate::collaborators::GenerationError;
use crate::commands::CommandError;
use crate::store::StoreError;
use folio_compiler_html::SurfaceError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

impl EditorError {
    /// Failures the user can retry by repeating the action
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EditorError::Surface(_))
    }
}
