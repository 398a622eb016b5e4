use crate::api::{
    error::ErrorBody,
    handlers::{self, health, login, park, slot, slots, unpark},
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        login::login,
        park::park,
        slot::slot,
        slots::slots,
        unpark::unpark,
    ),
    components(
        schemas(
            ErrorBody,
            health::Health,
            health::Occupancy,
            login::AccessToken,
            login::LoginRequest,
            handlers::PlateRequest,
            handlers::SlotStatus,
            handlers::Ticket,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "lot", description = "Park, inspect and unpark vehicles"),
        (name = "auth", description = "Exchange credentials for a bearer token"),
        (name = "health", description = "Service probes"),
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
