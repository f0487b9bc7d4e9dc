// src/api.rs
use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::config::PipelineOptions;
use crate::error::DashboardError;
use crate::http::get_text_with_retry;
use crate::state::{DashboardSnapshot, DashboardState};
use crate::summary::{generate_for_entry, GeneratedSummary, SummaryGenerator};

#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardState,
    /// Outbound client used by the feed relay.
    pub http: reqwest::Client,
    pub proxy_retries: u8,
    /// `None` when no API key is configured.
    pub summaries: Option<SummaryGenerator>,
    pub options: PipelineOptions,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/rss-proxy", get(rss_proxy))
        .route(
            "/generate-tweet",
            post(generate_tweet).fallback(method_not_allowed),
        )
        .route("/trends", get(trends))
        .route("/trends/{position}/summary", post(entry_summary))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

async fn method_not_allowed() -> Response {
    json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Relays the target feed verbatim.
async fn rss_proxy(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let Some(url) = q.get("url").map(|u| u.trim()).filter(|u| !u.is_empty()) else {
        return json_error(StatusCode::BAD_REQUEST, "URL parameter is required");
    };
    let is_http = reqwest::Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !is_http {
        return json_error(StatusCode::BAD_REQUEST, "URL must be an absolute http(s) URL");
    }

    match get_text_with_retry(&state.http, url, &[], state.proxy_retries).await {
        Ok(resp) => {
            let content_type = resp
                .content_type
                .unwrap_or_else(|| "text/plain; charset=utf-8".to_string());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type)],
                resp.body,
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(target: "proxy", error = %e, %url, "feed relay failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error fetching the RSS feed",
            )
        }
    }
}

/// `titles` must be a non-empty array of strings.
fn parse_titles(body: &[u8]) -> Result<Vec<String>, DashboardError> {
    let invalid = || DashboardError::Validation("Invalid titles provided".into());
    let v: Value = serde_json::from_slice(body).map_err(|_| invalid())?;
    let titles = v.get("titles").and_then(Value::as_array).ok_or_else(invalid)?;
    if titles.is_empty() {
        return Err(invalid());
    }
    titles
        .iter()
        .map(|t| t.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

async fn generate_tweet(State(state): State<AppState>, body: Bytes) -> Response {
    let titles = match parse_titles(&body) {
        Ok(t) => t,
        Err(e) => return e.into_response(),
    };
    let Some(generator) = state.summaries.as_ref() else {
        return DashboardError::Config("generation not configured".into()).into_response();
    };
    match generator.generate_summary(&titles).await {
        Ok(tweet) => Json(json!({ "tweet": tweet })).into_response(),
        Err(e) => {
            tracing::warn!(target: "summary", error = %e, "generate-tweet failed");
            e.into_response()
        }
    }
}

async fn trends(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.snapshot())
}

async fn entry_summary(
    State(state): State<AppState>,
    Path(position): Path<usize>,
) -> Result<Json<GeneratedSummary>, DashboardError> {
    if !state.options.include_summary_generation {
        return Err(DashboardError::NotFound("summary generation is disabled".into()));
    }
    let generator = state
        .summaries
        .as_ref()
        .ok_or_else(|| DashboardError::Config("generation not configured".into()))?;
    let summary = generate_for_entry(&state.dashboard, generator, position).await?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_validation() {
        assert!(parse_titles(br#"{"titles":["a","b"]}"#).is_ok());
        assert!(parse_titles(br#"{"titles":[]}"#).is_err());
        assert!(parse_titles(br#"{"titles":"a"}"#).is_err());
        assert!(parse_titles(br#"{"titles":[1]}"#).is_err());
        assert!(parse_titles(br#"{}"#).is_err());
        assert!(parse_titles(b"not json").is_err());
    }
}
