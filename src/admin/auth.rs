use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use super::AdminState;
use crate::http::response::ApiError;

/// True if `authorization` carries `Bearer {expected}`.
pub fn is_authorized(authorization: Option<&str>, expected: &str) -> bool {
    let Some(token) = authorization.and_then(|v| v.strip_prefix("Bearer ")) else {
        return false;
    };
    token.as_bytes().ct_eq(expected.as_bytes()).into()
}

pub async fn admin_auth_middleware(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if is_authorized(provided, &state.api_key) {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "Rejected admin request");
    ApiError::unauthorized().into_response()
}
