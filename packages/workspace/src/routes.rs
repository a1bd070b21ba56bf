//! HTTP API for the editing surface.
//!
//! - `GET  /api/versions`  list the version history
//! - `POST /api/versions`  append `{content, name?}`
//! - `POST /api/charts`    render a chart request to a base64 PNG

use crate::error::{ServerError, ServerResult};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use folio_editor::{ChartImage, ChartRenderer, ChartRequest, NewVersion, Version, VersionStore};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub versions: Arc<dyn VersionStore>,
    pub charts: Arc<dyn ChartRenderer>,
    pub version_control: bool,
}

impl AppState {
    pub fn new(versions: Arc<dyn VersionStore>, charts: Arc<dyn ChartRenderer>) -> Self {
        Self {
            versions,
            charts,
            version_control: true,
        }
    }

    pub fn with_version_control(mut self, enabled: bool) -> Self {
        self.version_control = enabled;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/versions", get(list_versions).post(create_version))
        .route("/api/charts", post(render_chart))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CreateVersionBody {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

async fn list_versions(State(state): State<AppState>) -> ServerResult<Json<Vec<Version>>> {
    if !state.version_control {
        return Err(ServerError::VersionControlDisabled);
    }
    Ok(Json(state.versions.list().await?))
}

async fn create_version(
    State(state): State<AppState>,
    Json(body): Json<CreateVersionBody>,
) -> ServerResult<Json<Version>> {
    if !state.version_control {
        return Err(ServerError::VersionControlDisabled);
    }

    let content = body
        .content
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("Content is required".to_string()))?;

    let version = state.versions.create(NewVersion::new(content, body.name)).await?;
    info!(id = %version.id, "version created");
    Ok(Json(version))
}

async fn render_chart(State(state): State<AppState>, Json(body): Json<Value>) -> ServerResult<Json<ChartImage>> {
    let present = |key: &str| body.get(key).map(|value| !value.is_null()).unwrap_or(false);
    if !present("chartType") || !present("data") {
        return Err(ServerError::BadRequest(
            "Missing required fields: chartType and data".to_string(),
        ));
    }

    let request: ChartRequest = serde_json::from_value(body)
        .map_err(|err| ServerError::BadRequest(format!("Invalid chart request: {}", err)))?;
    request.validate()?;

    let image = state.charts.render(&request).await?;
    info!(chart_type = request.chart_type.as_str(), "chart rendered");
    Ok(Json(image))
}
