use super::AuthError;
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use rand::{distributions::Alphanumeric, Rng};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use tracing::debug;
use uuid::Uuid;

const RANDOM_SECRET_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: u64,
}

/// HS256 signing and verification keys plus the token lifetime.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let secret = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a new access token for `subject`.
    ///
    /// # Errors
    /// Returns `AuthError::Sign` if the token cannot be encoded.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        let iat = get_current_timestamp();
        let expires_in = self.ttl.as_secs();
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(expires_in),
            jti: Uuid::now_v7().to_string(),
        };

        let access_token =
            encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Sign)?;

        debug!("issued token {} for {}", claims.jti, claims.sub);

        Ok(IssuedToken {
            access_token,
            expires_in,
        })
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// # Errors
    /// Returns `AuthError::InvalidToken` for malformed, expired or foreign tokens.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!("token rejected: {err}");
                AuthError::InvalidToken
            })
    }
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Generate a signing secret for deployments that do not configure one.
/// Tokens signed with it do not survive a restart.
#[must_use]
pub fn random_secret() -> SecretString {
    let secret: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SECRET_LEN)
        .map(char::from)
        .collect();
    SecretString::from(secret)
}
