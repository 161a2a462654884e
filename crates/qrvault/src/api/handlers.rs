//! Request handlers.
//!
//! Each handler validates its input, runs one vault operation inside a
//! storage session and maps the outcome to a JSON response.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use super::types::{MessageResponse, RecordResponse, SaveRequest, UserQuery};
use super::AppState;
use crate::error::{Error, Result};
use crate::vault::{self, NewRecord};

type QueryPairs = std::result::Result<Query<Vec<(String, String)>>, QueryRejection>;

/// `POST /save`
pub async fn save(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SaveRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordResponse>)> {
    let Json(request) = payload.map_err(|rejection| Error::invalid_input(rejection.body_text()))?;
    let new = NewRecord::parse(request.content.as_deref(), request.user_id.as_deref())?;

    let record = state
        .with_session(move |session| vault::save_record(session, &new))
        .await?;

    Ok((StatusCode::CREATED, Json(RecordResponse::from(&record))))
}

/// `GET /history`
pub async fn history(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<Vec<RecordResponse>>> {
    // An unreadable query string reads as an absent user_id
    let query = query
        .map(|Query(pairs)| UserQuery::from_pairs(pairs))
        .unwrap_or_default();

    let records = state
        .with_session(move |session| vault::list_history(session, query.user_id.as_deref()))
        .await?;

    Ok(Json(records.iter().map(RecordResponse::from).collect()))
}

/// `DELETE /history/{record_id}`
pub async fn delete(
    State(state): State<AppState>,
    record_id: std::result::Result<Path<i64>, PathRejection>,
    query: QueryPairs,
) -> Result<Json<MessageResponse>> {
    let Path(record_id) =
        record_id.map_err(|rejection| Error::invalid_input(rejection.body_text()))?;
    let Query(pairs) = query.map_err(|rejection| Error::invalid_input(rejection.body_text()))?;
    let query = UserQuery::from_pairs(pairs);

    state
        .with_session(move |session| {
            vault::delete_record(session, record_id, query.user_id.as_deref())
        })
        .await?;

    Ok(Json(MessageResponse::deleted()))
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
