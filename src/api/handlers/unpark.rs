use crate::{
    api::error::{ApiError, ErrorBody},
    lot::SlotStore,
};
use axum::{extract::Extension, Json};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{license_plate, PlateRequest, Ticket};

#[utoipa::path(
    delete,
    path= "/unpark",
    request_body = PlateRequest,
    responses (
        (status = 200, description = "Vehicle removed, slot freed", body = Ticket),
        (status = 400, description = "Malformed request", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No slot holds this license plate", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "lot",
)]
#[instrument(skip_all)]
pub async fn unpark(
    Extension(lot): Extension<Arc<SlotStore>>,
    payload: Option<Json<PlateRequest>>,
) -> Result<Json<Ticket>, ApiError> {
    let license_plate = license_plate(payload)?;
    let slot = lot.release(&license_plate).await?;

    debug!(slot, "unparked {license_plate}");

    Ok(Json(Ticket { license_plate, slot }))
}
