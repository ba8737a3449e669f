//! The historical query endpoint: `POST /messages/24-hour-cache`, registered
//! only when the retention store is enabled (§4.5, mirroring the original's
//! conditional `app.include_router(messages_router)`).

use crate::predicate::Predicate;
use crate::transport::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct QueryRequest {
    filters: Value,
    after_timestamp: Option<String>,
    max_items: Option<i64>,
}

pub async fn handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Response {
    let Some(store) = &state.store else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "retention store is not enabled");
    };

    let predicate = match Predicate::from_description(&request.filters) {
        Ok(predicate) => predicate,
        Err(err) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    };

    let after_timestamp = match request.after_timestamp.as_deref().map(parse_after) {
        Some(Ok(ts)) => Some(ts),
        Some(Err(err)) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
        None => None,
    };

    match store.query(&predicate, after_timestamp, request.max_items).await {
        Ok(events) => Json(events).into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

fn parse_after(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    crate::timeutil::parse_utc(s)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
