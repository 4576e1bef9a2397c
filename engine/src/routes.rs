use axum::{
    extract::{RawForm, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::{
    engine::{parse_raw_values, PhishingEngine},
    error::AppError,
    render,
};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PhishingEngine>,
    pub metrics: PrometheusHandle,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn index() -> Html<String> {
    Html(render::index_page(None, None))
}

/// A `url` field runs the URL pipeline; otherwise every field, in order, is a raw feature value.
pub async fn submit(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> Result<Html<String>, AppError> {
    let fields: Vec<(String, String)> = url::form_urlencoded::parse(&body).into_owned().collect();

    if let Some((_, url)) = fields.iter().find(|(name, _)| name == "url") {
        // scored exactly as submitted: whitespace counts toward length and the https prefix
        info!("Received assessment request for URL: {:?}", url);
        let result = state.engine.assess_url(url);
        return Ok(Html(render::index_page(Some(url.as_str()), Some(&result))));
    }

    debug!("Received raw feature submission with {} fields", fields.len());
    let values = parse_raw_values(fields.iter().map(|(_, v)| v.as_str()))?;
    let result = state.engine.assess_raw(&values)?;
    Ok(Html(render::index_page(None, Some(&result))))
}

pub async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "phishscan-engine",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
