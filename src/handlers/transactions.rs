use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::validation::{validate_status_update, validate_transaction, RawStatusUpdate, RawTransactionInput};
use crate::AppState;

/// Path ids that are not integers address nothing, so they are reported as 404.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::NotFound(format!("Transaction {} not found", raw)))
}

fn bad_json(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<RawTransactionInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = payload.map_err(bad_json)?;
    let new_tx = validate_transaction(&input)?;

    let created = state.transactions.create(new_tx).await?;
    tracing::info!(
        id = created.id,
        cryptocurrency = %created.cryptocurrency,
        amount = %created.amount,
        "transaction created"
    );

    Ok(Json(created))
}

pub async fn list_transactions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = state.transactions.list().await?;
    Ok(Json(transactions))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let tx = state.transactions.get_by_id(id).await?;
    Ok(Json(tx))
}

pub async fn update_transaction_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RawStatusUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let status = match payload
        .map_err(bad_json)
        .and_then(|Json(update)| validate_status_update(&update).map_err(AppError::from))
    {
        Ok(status) => status,
        Err(invalid) => {
            // An unknown id is reported before a bad body.
            state.transactions.get_by_id(id).await?;
            return Err(invalid);
        }
    };

    let updated = state.transactions.update_status(id, status).await?;
    tracing::info!(id, status = %updated.status, "transaction status updated");

    Ok(Json(updated))
}
