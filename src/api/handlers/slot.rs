use crate::{
    api::error::{ApiError, ErrorBody},
    lot::{LotError, SlotStore},
};
use axum::{
    extract::{Extension, Path},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use super::SlotStatus;

#[utoipa::path(
    get,
    path= "/slot/{slot_id}",
    params(
        ("slot_id" = i64, Path, description = "Zero-based slot index"),
    ),
    responses (
        (status = 200, description = "Slot status", body = SlotStatus),
        (status = 400, description = "Index out of range or not a number", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "lot",
)]
#[instrument(skip(lot))]
pub async fn slot(
    Extension(lot): Extension<Arc<SlotStore>>,
    Path(slot_id): Path<String>,
) -> Result<Json<SlotStatus>, ApiError> {
    // non-numeric ids are out of range too
    let index = slot_id.trim().parse::<i64>().map_err(|_| LotError::InvalidIndex {
        capacity: lot.capacity(),
    })?;

    let view = lot.inspect(index).await?;

    Ok(Json(view.into()))
}
