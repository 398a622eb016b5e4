use crate::{
    api::error::{ApiError, ErrorBody},
    lot::SlotStore,
};
use axum::{extract::Extension, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{license_plate, PlateRequest, Ticket};

#[utoipa::path(
    post,
    path= "/park",
    request_body = PlateRequest,
    responses (
        (status = 201, description = "Vehicle parked in the lowest free slot", body = Ticket),
        (status = 400, description = "Parking lot is full or the request is malformed", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "lot",
)]
#[instrument(skip_all)]
pub async fn park(
    Extension(lot): Extension<Arc<SlotStore>>,
    payload: Option<Json<PlateRequest>>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let license_plate = license_plate(payload)?;
    let slot = lot.allocate(license_plate.as_str()).await?;

    debug!(slot, "parked {license_plate}");

    Ok((StatusCode::CREATED, Json(Ticket { license_plate, slot })))
}
