//! Login credentials and bearer tokens.
//!
//! Flow Overview:
//! 1) At startup a single user is seeded into [`Credentials`] with a bcrypt hash.
//! 2) `POST /login` verifies the pair and asks [`TokenKeys`] for an HS256 token.
//! 3) Protected routes validate the bearer token and attach its [`Claims`] to the request.
//!
//! Nothing here knows about the parking lot.

mod credentials;
mod token;

pub use self::credentials::Credentials;
pub use self::token::{random_secret, Claims, IssuedToken, TokenKeys};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("failed to sign token: {0}")]
    Sign(jsonwebtoken::errors::Error),
}
