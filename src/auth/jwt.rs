use crate::types::{AppError, Result};
use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// Lifetime of an issued token.
pub const TOKEN_LIFETIME_HOURS: i64 = 6;

/// Signing algorithms accepted on the way in. Anything outside the HMAC
/// family is refused before the signature is looked at.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Payload carried by every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub authorized: bool,
    /// Expiry as a unix timestamp in seconds.
    pub exp: i64,
    #[serde(rename = "userID")]
    pub user_id: u64,
}

impl Claims {
    /// Builds the claims for a fresh token owned by `user_id`.
    pub fn for_user(user_id: u64) -> Self {
        Self {
            authorized: true,
            exp: (Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
            user_id,
        }
    }

    /// The authenticated subject, if the token grants authorization.
    pub fn subject(&self) -> Result<u64> {
        if !self.authorized {
            return Err(AppError::InvalidToken(
                "token is not authorized".to_string(),
            ));
        }
        Ok(self.user_id)
    }
}

/// Returns the token part of an `Authorization: <scheme> <token>` header.
///
/// Any header that does not split into exactly two space-separated parts
/// yields an empty token, which then fails to parse.
pub fn bearer_token(headers: &HeaderMap) -> &str {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_scheme), Some(token), None) => token,
        _ => "",
    }
}

/// Issues and validates HS256 bearer tokens with a single server-held secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Creates a token service bound to `secret` for its whole lifetime.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Signs a token for `user_id` expiring [`TOKEN_LIFETIME_HOURS`] from now.
    pub fn issue(&self, user_id: u64) -> Result<String> {
        encode(
            &Header::new(Algorithm::HS256),
            &Claims::for_user(user_id),
            &self.encoding_key,
        )
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a raw token string and returns its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let header =
            decode_header(token).map_err(|e| AppError::InvalidToken(e.to_string()))?;

        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(AppError::InvalidToken(format!(
                "unexpected signing method: {:?}",
                header.alg
            )));
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::InvalidToken(e.to_string()))
    }

    /// Validates the bearer token carried by a request.
    pub fn validate(&self, headers: &HeaderMap) -> Result<Claims> {
        self.verify_token(bearer_token(headers))
    }

    /// Validates the request's token and returns the authenticated user id.
    pub fn extract_subject(&self, headers: &HeaderMap) -> Result<u64> {
        self.validate(headers)?.subject()
    }
}
