//! Per-peer-IP rate limiting for the whole API.

use std::time::Duration;

use actix_governor::governor::clock::QuantaInstant;
use actix_governor::governor::middleware::NoOpMiddleware;
use actix_governor::governor::NotUntil;
use actix_governor::{GovernorConfig, GovernorConfigBuilder, KeyExtractor, PeerIpKeyExtractor};
use actix_web::dev::ServiceRequest;
use actix_web::{HttpResponse, HttpResponseBuilder};

use crate::config::ConfigError;
use crate::constants::ERR_RATE_LIMITED;
use crate::errors::ApiError;

pub type RateLimiterConfig =
    GovernorConfig<RateLimitKeyExtractor, NoOpMiddleware<QuantaInstant>>;

/// Keys by peer IP and answers rejected requests with the JSON error body.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitKeyExtractor;

impl KeyExtractor for RateLimitKeyExtractor {
    type Key = <PeerIpKeyExtractor as KeyExtractor>::Key;
    type KeyExtractionError = <PeerIpKeyExtractor as KeyExtractor>::KeyExtractionError;

    fn name(&self) -> &'static str {
        "peer IP"
    }

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        PeerIpKeyExtractor.extract(req)
    }

    fn exceed_rate_limit_response(
        &self,
        _negative: &NotUntil<QuantaInstant>,
        mut response: HttpResponseBuilder,
    ) -> HttpResponse {
        response.json(ApiError::TooManyRequests(ERR_RATE_LIMITED.to_string()).envelope(None))
    }
}

/// Allow `max_requests` per `window` for each client IP.
///
/// The bucket holds `max_requests` and refills one request every
/// `window / max_requests`.
///
/// Usage:
/// ```ignore
/// let config = build_rate_limiter_config(100, Duration::from_secs(60))?;
/// App::new().wrap(Governor::new(&config))
/// ```
pub fn build_rate_limiter_config(
    max_requests: u32,
    window: Duration,
) -> Result<RateLimiterConfig, ConfigError> {
    if max_requests == 0 {
        return Err(ConfigError::RateLimiter);
    }
    let replenish_ms = (window.as_millis() / u128::from(max_requests)) as u64;
    if replenish_ms == 0 {
        return Err(ConfigError::RateLimiter);
    }

    GovernorConfigBuilder::default()
        .milliseconds_per_request(replenish_ms)
        .burst_size(max_requests)
        .key_extractor(RateLimitKeyExtractor)
        .finish()
        .ok_or(ConfigError::RateLimiter)
}
