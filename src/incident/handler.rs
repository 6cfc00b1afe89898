//! HTTP handlers for the incident endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, warn};

use super::command::SlashCommand;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::security::unix_secs;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `POST /api/slack/incident`
pub async fn slack_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let verified = state.verifier.verify(
        header(&headers, SIGNATURE_HEADER),
        header(&headers, TIMESTAMP_HEADER),
        &body,
    );
    if !verified {
        warn!("Rejected Slack command with invalid signature");
        metrics::record_signature_failure();
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid signature" })),
        )
            .into_response();
    }

    let payload = match SlashCommand::from_form(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Malformed slash command payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Malformed payload" })),
            )
                .into_response();
        }
    };

    debug!(user = %payload.user_name, text = %payload.text, "Slash command received");
    Json(state.incidents.execute(&payload, unix_secs())).into_response()
}

/// `GET /api/incidents/{id}`
pub async fn get_incident(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.incidents.store().get(&id) {
        Some(incident) => Json(incident).into_response(),
        None => ApiError::not_found(format!("Incident {id} not found")).into_response(),
    }
}
