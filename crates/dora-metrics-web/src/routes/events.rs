use axum::{
    body::Bytes,
    extract::{
        Path,
        State,
    },
    http::StatusCode,
    routing::post,
    Json,
    Router,
};
use dora_metrics_core::{
    Ack,
    DomainError,
    MetricKind,
};
use serde_json::Value;

use crate::error::{
    ApiResult,
    AppError,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{metric}", post(handle_event))
}

/// One invocation per request; the response status mirrors the acknowledgement
async fn handle_event(
    State(state): State<AppState>, Path(metric): Path<String>, body: Bytes,
) -> ApiResult<(StatusCode, Json<Ack>)> {
    let kind: MetricKind = metric.parse().map_err(|_| {
        let known: Vec<&str> = MetricKind::ALL.iter().map(MetricKind::slug).collect();
        AppError::unknown_metric(&metric, &known)
    })?;

    let ack = match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => {
            let timeout = state.context.config.invocation_timeout();
            match tokio::time::timeout(timeout, state.context.handler.handle(kind, &payload)).await
            {
                Ok(ack) => ack,
                Err(_) => {
                    tracing::error!(
                        metric = %kind,
                        timeout_secs = timeout.as_secs(),
                        "Invocation timed out"
                    );
                    Ack::processing_error()
                }
            }
        }
        Err(e) => {
            tracing::warn!(metric = %kind, error = %e, "Event body is not valid JSON");
            Ack::failure(&DomainError::MalformedEvent(e.to_string()))
        }
    };

    let status =
        StatusCode::from_u16(ack.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(ack)))
}
