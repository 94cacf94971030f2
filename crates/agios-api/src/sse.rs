//! Server-sent event transport.
//!
//! An [`SseEmitter`] writes named events into a bounded channel whose
//! receiving half is the body of the HTTP response. Frames go out in the
//! order they were sent, one `event:`/`data:` pair per call.

use std::convert::Infallible;

use agios_types::StreamEvent;
use axum::{
    http::{header, HeaderName, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

#[derive(Error, Debug)]
pub enum EmitError {
    /// The client disconnected
    #[error("event stream closed by peer")]
    Closed,

    #[error("failed to encode event payload: {0}")]
    Encode(#[from] axum::Error),
}

/// Sending half of one response's event stream
#[derive(Debug, Clone)]
pub struct SseEmitter {
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
}

/// Receiving half, turned into the `text/event-stream` response
#[derive(Debug)]
pub struct SseResponse {
    rx: mpsc::Receiver<Event>,
}

/// Open an event stream tied to `cancel`: once the peer goes away the token
/// is cancelled
pub fn channel(capacity: usize, cancel: CancellationToken) -> (SseEmitter, SseResponse) {
    let (tx, rx) = mpsc::channel(capacity);
    (SseEmitter { tx, cancel }, SseResponse { rx })
}

impl SseEmitter {
    pub async fn send_event(&self, name: &str, payload: &Value) -> Result<(), EmitError> {
        let event = Event::default().event(name).json_data(payload)?;
        self.tx.send(event).await.map_err(|_| {
            self.cancel.cancel();
            EmitError::Closed
        })
    }

    /// Resolves when the response body has been dropped
    pub async fn closed(&self) {
        self.tx.closed().await;
    }

    /// Relay pipeline events until the pipeline finishes or the client leaves
    pub async fn forward(self, mut events: mpsc::Receiver<StreamEvent>) {
        loop {
            tokio::select! {
                biased;
                _ = self.closed() => {
                    tracing::debug!("client disconnected, cancelling run");
                    self.cancel.cancel();
                    break;
                }
                next = events.recv() => {
                    let Some(event) = next else { break };
                    if let Err(e) = self.send_event(event.name(), &event.payload()).await {
                        tracing::debug!(error = %e, event = event.name(), "stopped relaying events");
                        self.cancel.cancel();
                        break;
                    }
                }
            }
        }
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let mut rx = self.rx;
        let stream = async_stream::stream! {
            while let Some(event) = rx.recv().await {
                yield Ok::<Event, Infallible>(event);
            }
        };

        let mut response = Sse::new(stream).keep_alive(KeepAlive::default()).into_response();
        let headers = response.headers_mut();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
        response
    }
}
