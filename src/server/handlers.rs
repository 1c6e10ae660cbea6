//! API endpoint handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::AppState;
use crate::analysis::analyze_receipts;
use crate::models::Receipt;
use crate::repository::RepositoryError;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn repo_error(err: RepositoryError) -> Response {
    match err {
        RepositoryError::NotFound(id) => error_response(
            StatusCode::NOT_FOUND,
            &format!("receipt not found: {id}"),
        ),
        err => {
            error!("repository error: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        }
    }
}

/// Analyze an uploaded receipt image and persist the result.
///
/// Expects a multipart form with an `image` part. Always stores a receipt
/// when an image arrives; failed recognition stores the degraded record.
pub async fn analyze_receipt(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let mut upload: Option<(Vec<u8>, Option<String>)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("image") {
                    continue;
                }
                let content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => upload = Some((bytes.to_vec(), content_type)),
                    Err(err) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            &format!("failed to read image part: {err}"),
                        )
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("malformed multipart body: {err}"),
                )
            }
        }
    }

    let Some((bytes, content_type)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "an image file is required");
    };

    let receipt = state
        .service
        .process_receipt_image(&bytes, content_type.as_deref())
        .await;

    match state.repo.create(receipt).await {
        Ok(stored) => (StatusCode::CREATED, Json(json!({ "receipt": stored }))).into_response(),
        Err(err) => repo_error(err),
    }
}

/// Query parameters for receipt listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Search term over store name, order number, and item names.
    pub q: Option<String>,
}

/// List receipts, newest first, optionally filtered by a search term.
pub async fn list_receipts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let result = match params.q {
        Some(term) => state.repo.search(&term).await,
        None => state.repo.list().await,
    };

    match result {
        Ok(receipts) => Json(json!({ "receipts": receipts })).into_response(),
        Err(err) => repo_error(err),
    }
}

/// Fetch one receipt by id.
pub async fn get_receipt(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.repo.get(&id).await {
        Ok(Some(receipt)) => Json(json!({ "receipt": receipt })).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, &format!("receipt not found: {id}")),
        Err(err) => repo_error(err),
    }
}

/// Replace a stored receipt (whole-record edit).
pub async fn update_receipt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(receipt): Json<Receipt>,
) -> Response {
    match state.repo.update(&id, receipt).await {
        Ok(updated) => Json(json!({ "receipt": updated })).into_response(),
        Err(err) => repo_error(err),
    }
}

/// Delete a receipt.
pub async fn delete_receipt(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.repo.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => repo_error(err),
    }
}

/// Aggregate spend analysis over every stored receipt.
pub async fn receipt_analysis(State(state): State<AppState>) -> Response {
    match state.repo.list().await {
        Ok(receipts) => Json(analyze_receipts(&receipts)).into_response(),
        Err(err) => repo_error(err),
    }
}
