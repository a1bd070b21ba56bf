//! Remote clients against a live router on an ephemeral port

use async_trait::async_trait;
use folio_editor::{
    ChartError, ChartImage, ChartRenderer, ChartRequest, ChartType, EditorConfig, MemoryVersionStore,
    NewVersion, StoreError, VersionController, VersionStore,
};
use folio_parser::parse;
use folio_workspace::{router, AppState, HttpChartRenderer, HttpVersionStore};
use serde_json::json;
use std::sync::Arc;

struct NoCharts;

#[async_trait]
impl ChartRenderer for NoCharts {
    async fn render(&self, _request: &ChartRequest) -> Result<ChartImage, ChartError> {
        Err(ChartError::Renderer("charts offline".to_string()))
    }
}

async fn serve(version_control: bool) -> String {
    let state = AppState::new(Arc::new(MemoryVersionStore::new()), Arc::new(NoCharts))
        .with_version_control(version_control);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}/api", addr)
}

#[tokio::test]
async fn test_http_store_roundtrip() {
    let store = HttpVersionStore::new(serve(true).await);

    let created = store
        .create(NewVersion::new("<p>Body</p>", Some("Named".to_string())))
        .await
        .unwrap();
    assert_eq!(store.list().await.unwrap(), vec![created]);
}

#[tokio::test]
async fn test_http_store_reports_rejection() {
    let store = HttpVersionStore::new(serve(false).await);

    assert_eq!(
        store.list().await,
        Err(StoreError::Rejected {
            status: 403,
            message: "Version control is disabled".to_string()
        })
    );
}

#[tokio::test]
async fn test_controller_over_http() {
    let store = Arc::new(HttpVersionStore::new(serve(true).await));
    let controller = VersionController::new(store.clone(), EditorConfig::default());

    let initial = controller
        .capture_initial(parse("# Remote\nSaved over HTTP"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(initial.content, controller.content());

    let reloaded = VersionController::new(store, EditorConfig::default());
    assert_eq!(reloaded.load_versions().await.unwrap(), vec![initial]);
}

#[tokio::test]
async fn test_http_chart_failure_message() {
    let charts = HttpChartRenderer::new(serve(true).await);
    let request = ChartRequest::new(ChartType::Bar, json!({ "categories": ["a"], "values": [1] }));

    assert_eq!(
        charts.render(&request).await,
        Err(ChartError::Renderer("Chart generation failed: charts offline".to_string()))
    );
}
