//! # Folio Workspace
//!
//! Server side of the report editor: the versions and charts HTTP API, the
//! chart script runner, and HTTP clients implementing the editor's
//! collaborator traits against a remote API.

pub mod charts;
pub mod client;
pub mod error;
pub mod routes;

pub use charts::ProcessChartRenderer;
pub use client::{HttpChartRenderer, HttpReportGenerator, HttpVersionStore, DEFAULT_API_URL};
pub use error::{ServerError, ServerResult};
pub use routes::{router, AppState};
