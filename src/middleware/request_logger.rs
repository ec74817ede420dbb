//! Request logging middleware.
//!
//! Logs one line when a request starts and one when it finishes. The model
//! credential header is reported only as present or absent.

use std::future::{Ready, ready};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use futures_util::future::LocalBoxFuture;
use tracing::{error, info, warn};

use crate::config::{MODEL_API_KEY_HEADER, MODEL_PROVIDER_HEADER};

/// Request logger middleware factory.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

/// Request logger middleware service.
pub struct RequestLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let remote_addr = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        let model_key = if req.headers().contains_key(MODEL_API_KEY_HEADER) {
            "present"
        } else {
            "none"
        };
        let provider = req
            .headers()
            .get(MODEL_PROVIDER_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("default")
            .to_string();

        info!(
            target: "api",
            method = %method,
            path = %path,
            remote_addr = %remote_addr,
            model_key = model_key,
            provider = %provider,
            "Request started"
        );

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status();
            let duration_ms = start.elapsed().as_millis();

            if status.is_server_error() {
                error!(target: "api", method = %method, path = %path,
                    status = status.as_u16(), duration_ms = %duration_ms, "Server error");
            } else if status.is_client_error() {
                warn!(target: "api", method = %method, path = %path,
                    status = status.as_u16(), duration_ms = %duration_ms, "Client error");
            } else {
                info!(target: "api", method = %method, path = %path,
                    status = status.as_u16(), duration_ms = %duration_ms, "Request completed");
            }

            Ok(res)
        })
    }
}
