//! # Formatting Pipeline
//!
//! Raw generated text → Document → styled surface.
//!
//! Input that is already surface markup (a restored version, an exported
//! file, the editor's own output) is read back rather than re-parsed, so
//! annotated spans are never wrapped twice.

use folio_compiler_html::{is_surface_markup, read_surface, SurfaceError};
use folio_parser::{parse, Document};
use tracing::warn;

pub use folio_compiler_html::{render, render_html, StyledContent};

/// Format raw text (or surface markup) into a document. Total.
pub fn format(raw: &str) -> Document {
    if is_surface_markup(raw) {
        match read_surface(raw) {
            Ok(document) => return document,
            Err(err) => warn!(error = %err, "unreadable surface markup, parsing as text"),
        }
    }
    parse(raw)
}

/// `render_html(format(raw))`
pub fn format_to_html(raw: &str) -> String {
    render_html(&format(raw))
}

/// Round-trip a document through its rendered surface, yielding the
/// canonical form the editing surface would report back.
pub fn rederive(document: &Document) -> Result<Document, SurfaceError> {
    read_surface(&render_html(document))
}
