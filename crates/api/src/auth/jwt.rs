//! Access-token issuing and verification.
//!
//! Tokens are HS256-signed JWTs. There is no refresh flow: when a token
//! expires the client logs in again with phone number and password.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use ridepool_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The user's database id.
    pub sub: DbId,
    /// The login identifier, echoed for client convenience.
    pub phone_number: String,
    /// Role name, e.g. `"ROLE_PASSENGER"`.
    pub role: String,
    /// Expiry (Unix seconds).
    pub exp: i64,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Per-token UUID for audit trails.
    pub jti: String,
}

/// Signing configuration shared by issuing and verification.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// Read `JWT_SECRET` (required, non-empty) and
    /// `JWT_ACCESS_EXPIRY_MINS` (optional, default 60) from the
    /// environment. Panics when the secret is missing, since every
    /// authenticated request would fail anyway.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .map(|raw| {
                raw.parse()
                    .expect("JWT_ACCESS_EXPIRY_MINS must be a number of minutes")
            })
            .unwrap_or(60);

        Self {
            secret,
            access_token_expiry_mins,
        }
    }
}

/// Issue an access token for the given user.
pub fn generate_access_token(
    user_id: DbId,
    phone_number: &str,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let iat = chrono::Utc::now().timestamp();

    let claims = Claims {
        sub: user_id,
        phone_number: phone_number.to_string(),
        role: role.to_string(),
        exp: iat + config.access_token_expiry_mins * 60,
        iat,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify a token's signature and expiry and return its claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
