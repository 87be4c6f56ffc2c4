use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

use window_metrics::WindowReport;

use crate::AppState;

// ─── GET /api/metrics ────────────────────────────────────────────
/// Latest closed window of the load meter; `null` before the first one.

pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<Option<WindowReport>> {
    Json(state.reports.borrow().clone())
}

// ─── GET /api/metrics/http ───────────────────────────────────────
/// Latest closed window of the API's own request latencies.

pub async fn get_http_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<Option<WindowReport>> {
    Json(state.http_reports.borrow().clone())
}

// ─── GET /api/metrics/stream ─────────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes every window report as JSON as soon as the reporter closes it.

pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.reports.clone())
        .filter_map(|report| report)
        .map(|report| {
            let json = serde_json::to_string(&report).unwrap_or_default();
            Ok(Event::default().data(json))
        });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
