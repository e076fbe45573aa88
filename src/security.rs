//! API key authentication
//!
//! A single optional Bearer key guards every route except `/health`. When no
//! key is configured, all requests pass through.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;

use crate::config::SecurityConfig;
use crate::error::MockError;

/// Bearer-key check middleware
pub async fn require_api_key(
    State(security): State<Arc<SecurityConfig>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    request: Request,
    next: Next,
) -> Result<Response, MockError> {
    let Some(expected) = security.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    // Liveness probes stay open even with auth enabled
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    match bearer {
        Some(TypedHeader(Authorization(token))) if token.token() == expected => {
            Ok(next.run(request).await)
        }
        Some(_) => Err(MockError::AuthenticationFailed(
            "invalid API key".to_string(),
        )),
        None => Err(MockError::AuthenticationFailed(
            "API key required but not provided".to_string(),
        )),
    }
}
