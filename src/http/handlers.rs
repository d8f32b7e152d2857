use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::ConfigSnapshot;

/// Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// State injected into debug handlers.
#[derive(Clone)]
pub struct DebugState {
    pub metrics: PrometheusHandle,
    pub config: Arc<ConfigSnapshot>,
}

pub async fn get_metrics(State(state): State<DebugState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}

pub async fn get_healthz() -> &'static str {
    "ok"
}

pub async fn get_config(State(state): State<DebugState>) -> Json<ConfigSnapshot> {
    Json(state.config.as_ref().clone())
}
