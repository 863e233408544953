//! Centralized error responder
//!
//! Handlers and extractors return `AppError`; its `IntoResponse` impl writes
//! the status and `{error, message}` body. This layer is the single place
//! that logs those failures, with the request context the error itself
//! does not carry.

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::error::ErrorReport;

pub async fn error_responder(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;

    if let Some(report) = response.extensions().get::<ErrorReport>() {
        let status = response.status().as_u16();
        match &report.detail {
            Some(detail) => tracing::error!(
                kind = report.kind,
                status,
                %method,
                %path,
                %client,
                message = %report.message,
                detail = %detail,
                "request failed"
            ),
            None => tracing::warn!(
                kind = report.kind,
                status,
                %method,
                %path,
                %client,
                message = %report.message,
                "request rejected"
            ),
        }
    }

    response
}
