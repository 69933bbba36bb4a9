//! Request id middleware.
//!
//! Reuses a well-formed inbound `X-Request-ID` or generates a UUID v4, stores
//! it in the request extensions and echoes it on the response. Failed requests
//! are logged here, once, and their body is replaced by the JSON error body
//! carrying the request id. A panic further down the stack becomes a 500.

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderName, HeaderValue},
    Error, HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use futures::FutureExt;
use log::{error, warn};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use uuid::Uuid;

use crate::errors::{error_response_for, ApiError};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Request id stored in the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

pub struct RequestIdMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequestIdMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestIdMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct RequestIdMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestIdMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let request_id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            let method = req.method().clone();
            let path = req.path().to_string();
            req.extensions_mut().insert(RequestId(request_id.clone()));
            let http_req = req.request().clone();

            let outcome = AssertUnwindSafe(async move { service.call(req).await })
                .catch_unwind()
                .await;

            let mut res = match outcome {
                Ok(Ok(res)) => res.map_into_left_body(),
                Ok(Err(err)) => ServiceResponse::from_err(err, http_req).map_into_right_body(),
                Err(panic) => {
                    let cause = format!("handler panicked: {}", panic_message(panic.as_ref()));
                    ServiceResponse::from_err(ApiError::InternalServerError(cause), http_req)
                        .map_into_right_body()
                }
            };

            let status = res.status();
            let rewritten = res.response().error().map(|err| {
                if status.is_server_error() {
                    error!(
                        "request failed request_id={} method={} path={} status={} error={}",
                        request_id,
                        method,
                        path,
                        status.as_u16(),
                        err
                    );
                } else {
                    warn!(
                        "request failed request_id={} method={} path={} status={} error={}",
                        request_id,
                        method,
                        path,
                        status.as_u16(),
                        err
                    );
                }
                error_response_for(err, status, &request_id)
            });

            if let Some(mut replacement) = rewritten {
                for (name, value) in res.headers() {
                    if *name != header::CONTENT_TYPE && *name != header::CONTENT_LENGTH {
                        replacement.headers_mut().append(name.clone(), value.clone());
                    }
                }
                let (http_req, _) = res.into_parts();
                res = ServiceResponse::<BoxBody>::new(http_req, replacement).map_into_right_body();
            }

            if let Ok(value) = HeaderValue::from_str(&request_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            Ok(res)
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
