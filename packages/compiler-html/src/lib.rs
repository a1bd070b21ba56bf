//! Rendering between the annotation model and the styled editing surface.
//!
//! ```text
//! Document ──render──▶ StyledContent ──to_html──▶ surface markup
//!    ▲                                                  │
//!    └──────────────────read_surface────────────────────┘
//! ```

pub mod compiler;
pub mod error;
pub mod reader;
pub mod styled;

pub use compiler::{escape_html, export_document, render, render_html, ExportOptions};
pub use error::{SurfaceError, SurfaceResult};
pub use reader::{decode_entities, is_surface_markup, read_markup, read_surface};
pub use styled::{StyledContent, StyledNode};
