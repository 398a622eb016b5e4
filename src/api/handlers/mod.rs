pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::login;

pub mod park;
pub use self::park::park;

pub mod slot;
pub use self::slot::slot;

pub mod slots;
pub use self::slots::slots;

pub mod unpark;
pub use self::unpark::unpark;

// common types and validation for the lot handlers
use crate::{api::error::ApiError, lot::SlotView};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Longest license plate accepted, in characters. Bounds the memory one slot can pin.
pub const MAX_LICENSE_PLATE_LEN: usize = 64;

/// Body of `POST /park` and `DELETE /unpark`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct PlateRequest {
    #[schema(example = "ABC123")]
    pub license_plate: Option<String>,
}

/// A vehicle and the slot it holds (or held).
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub license_plate: String,
    pub slot: usize,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SlotStatus {
    pub slot: usize,
    pub occupied: bool,
    pub license_plate: Option<String>,
}

impl From<SlotView> for SlotStatus {
    fn from(view: SlotView) -> Self {
        Self {
            slot: view.index,
            occupied: view.occupied,
            license_plate: view.occupant,
        }
    }
}

/// Any non-blank string up to [`MAX_LICENSE_PLATE_LEN`] characters, kept verbatim.
#[must_use]
pub fn valid_license_plate(plate: &str) -> bool {
    !plate.trim().is_empty() && plate.chars().count() <= MAX_LICENSE_PLATE_LEN
}

/// Pull a well-formed plate out of an optional JSON body.
fn license_plate(payload: Option<Json<PlateRequest>>) -> Result<String, ApiError> {
    payload
        .and_then(|Json(request)| request.license_plate)
        .filter(|plate| valid_license_plate(plate))
        .ok_or(ApiError::InvalidRequest)
}
