use crate::{api::error::ErrorBody, lot::SlotStore};
use axum::{extract::Extension, Json};
use std::sync::Arc;
use tracing::instrument;

use super::SlotStatus;

#[utoipa::path(
    get,
    path= "/slots",
    responses (
        (status = 200, description = "Every slot, in index order", body = [SlotStatus]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "lot",
)]
#[instrument(skip_all)]
pub async fn slots(Extension(lot): Extension<Arc<SlotStore>>) -> Json<Vec<SlotStatus>> {
    let slots = lot.snapshot().await;
    Json(slots.into_iter().map(SlotStatus::from).collect())
}
