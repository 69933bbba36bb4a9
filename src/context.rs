//! Per-request deadline and cancellation carried into every storage call.

use std::future::{ready, Ready};
use std::time::Duration;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::middleware::RequestExt;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// App-wide inputs for building a [`RequestContext`]: the request deadline and
/// the process shutdown token every request token is derived from.
#[derive(Clone)]
pub struct ContextSettings {
    request_timeout: Duration,
    shutdown: CancellationToken,
}

impl ContextSettings {
    pub fn new(request_timeout: Duration, shutdown: CancellationToken) -> Self {
        Self {
            request_timeout,
            shutdown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    deadline: Instant,
    cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new(
        request_id: impl Into<String>,
        timeout: Duration,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            deadline: Instant::now() + timeout,
            cancellation,
        }
    }

    /// A context that is not tied to any inbound request or shutdown signal.
    pub fn background(timeout: Duration) -> Self {
        Self::new("background", timeout, CancellationToken::new())
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl FromRequest for RequestContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let request_id = req.request_id().unwrap_or_else(|| "-".to_string());

        let ctx = match req.app_data::<web::Data<ContextSettings>>() {
            Some(settings) => Self::new(
                request_id,
                settings.request_timeout,
                settings.shutdown.child_token(),
            ),
            None => Self::new(request_id, DEFAULT_REQUEST_TIMEOUT, CancellationToken::new()),
        };

        ready(Ok(ctx))
    }
}
