//! Interfaces to the services around the editor: the report generator and
//! the chart image renderer. Both run out of process; the editor only
//! sees their results or an explicit error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    #[default]
    Written,
    Analytics,
    Comprehensive,
}

/// Everything the generator needs to produce a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub report_type: ReportType,
    pub report_description: String,
    pub selected_model: String,
    #[serde(default)]
    pub policy_documents: Vec<String>,
    #[serde(default)]
    pub data_files: Vec<String>,
    #[serde(default)]
    pub writing_style_files: Vec<String>,
    /// 0 favours speed, 100 favours quality
    #[serde(default = "default_performance_level")]
    pub performance_level: u8,
    #[serde(default)]
    pub factual_confidence: bool,
    #[serde(default)]
    pub draft_mode: bool,
    #[serde(default)]
    pub source_citations: bool,
}

fn default_performance_level() -> u8 {
    50
}

impl GenerationRequest {
    pub fn new(report_description: impl Into<String>, selected_model: impl Into<String>) -> Self {
        Self {
            report_type: ReportType::default(),
            report_description: report_description.into(),
            selected_model: selected_model.into(),
            policy_documents: Vec::new(),
            data_files: Vec::new(),
            writing_style_files: Vec::new(),
            performance_level: default_performance_level(),
            factual_confidence: false,
            draft_mode: false,
            source_citations: false,
        }
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.report_description.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "report description is required".to_string(),
            ));
        }
        if self.selected_model.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("a model must be selected".to_string()));
        }
        if self.performance_level > 100 {
            return Err(GenerationError::InvalidRequest(format!(
                "performance level must be 0-100, got {}",
                self.performance_level
            )));
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("Report generator unavailable: {0}")]
    Unavailable(String),

    #[error("Report generation failed: {0}")]
    Failed(String),
}

/// Produces raw report text
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    Histogram,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::Histogram => "histogram",
        }
    }

    /// Keys the `data` object must carry for this chart type
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ChartType::Bar => &["categories", "values"],
            ChartType::Line | ChartType::Scatter => &["x", "y"],
            ChartType::Pie => &["labels", "values"],
            ChartType::Histogram => &["values"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    pub chart_type: ChartType,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
}

impl ChartRequest {
    pub fn new(chart_type: ChartType, data: Value) -> Self {
        Self {
            chart_type,
            data,
            title: None,
            x_label: None,
            y_label: None,
            colors: None,
        }
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        let data = self
            .data
            .as_object()
            .ok_or_else(|| ChartError::InvalidRequest("data must be an object".to_string()))?;

        for field in self.chart_type.required_fields() {
            if !data.get(*field).map(Value::is_array).unwrap_or(false) {
                return Err(ChartError::InvalidRequest(format!(
                    "{} chart requires a `{}` array",
                    self.chart_type.as_str(),
                    field
                )));
            }
        }
        Ok(())
    }
}

/// Rendered chart, image as base64 PNG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartImage {
    pub image: String,
    pub chart_type: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("Invalid chart request: {0}")]
    InvalidRequest(String),

    #[error("Chart renderer could not be started: {0}")]
    Spawn(String),

    #[error("Chart renderer exited with status {status}: {stderr}")]
    Exit { status: i32, stderr: String },

    #[error("Chart renderer reported diagnostics: {0}")]
    Diagnostics(String),

    #[error("Unreadable chart renderer output: {0}")]
    InvalidOutput(String),

    #[error("Chart generation failed: {0}")]
    Renderer(String),
}

#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, request: &ChartRequest) -> Result<ChartImage, ChartError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chart_request_wire_format() {
        let request: ChartRequest = serde_json::from_value(json!({
            "chartType": "bar",
            "data": { "categories": ["a"], "values": [1] },
            "xLabel": "Quarter"
        }))
        .unwrap();

        assert_eq!(request.chart_type, ChartType::Bar);
        assert_eq!(request.x_label.as_deref(), Some("Quarter"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_chart_request_requires_fields() {
        let request = ChartRequest::new(ChartType::Pie, json!({ "labels": ["a"] }));
        assert_eq!(
            request.validate(),
            Err(ChartError::InvalidRequest("pie chart requires a `values` array".to_string()))
        );

        let request = ChartRequest::new(ChartType::Line, json!([1, 2]));
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_generation_request_defaults() {
        let request: GenerationRequest = serde_json::from_value(json!({
            "reportType": "analytics",
            "reportDescription": "Q3 revenue review",
            "selectedModel": "gpt-4"
        }))
        .unwrap();

        assert_eq!(request.report_type, ReportType::Analytics);
        assert_eq!(request.performance_level, 50);
        assert!(request.validate().is_ok());
        assert!(GenerationRequest::new(" ", "gpt-4").validate().is_err());
    }
}
