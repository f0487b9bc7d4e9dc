// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

/// Failures crossing a pipeline boundary (proxy, feed, enrichment, generation).
#[derive(Debug, Clone, thiserror::Error)]
pub enum DashboardError {
    /// Network/HTTP failure reaching the proxy, the search API or the model API.
    #[error("transport error: {0}")]
    Transport(String),

    /// Missing or malformed request parameters at a boundary.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Feed markup does not have the expected shape.
    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("summary for entry {0} is already being generated")]
    InFlight(usize),
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::Validation(_) => StatusCode::BAD_REQUEST,
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::InFlight(_) => StatusCode::CONFLICT,
            DashboardError::Transport(_)
            | DashboardError::Parse(_)
            | DashboardError::Generation(_)
            | DashboardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
