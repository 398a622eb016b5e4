use crate::{
    api::error::{ApiError, ErrorBody},
    auth::{AuthError, Credentials, TokenKeys},
};
use axum::{extract::Extension, Json};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Default)]
pub struct LoginRequest {
    #[schema(example = "admin")]
    username: Option<String>,
    password: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

#[utoipa::path(
    post,
    path= "/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Login successful", body = AccessToken),
        (status = 400, description = "Missing username or password", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = ErrorBody),
    ),
    tag = "auth",
)]
#[instrument(skip_all)]
pub async fn login(
    Extension(credentials): Extension<Arc<Credentials>>,
    Extension(keys): Extension<Arc<TokenKeys>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Json<AccessToken>, ApiError> {
    let Some(Json(LoginRequest {
        username: Some(username),
        password: Some(password),
    })) = payload
    else {
        return Err(ApiError::InvalidRequest);
    };
    let password = SecretString::from(password);

    // bcrypt is CPU-bound, keep it off the async workers
    let user = username.clone();
    let valid = task::spawn_blocking(move || credentials.verify(&user, password.expose_secret()))
        .await
        .map_err(|err| {
            error!("password verification task failed: {err}");
            ApiError::Internal
        })?;

    if !valid {
        warn!("failed login attempt for {username}");
        return Err(AuthError::InvalidCredentials.into());
    }

    let issued = keys.issue(&username)?;
    info!("login successful for {username}");

    Ok(Json(AccessToken {
        access_token: issued.access_token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    }))
}
