use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is not a user id")]
    InvalidSubject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(user_id: Uuid, email: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidSubject)
    }
}

/// HS256 signer/verifier for API access tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, claims: &AccessClaims) -> Result<String, JwtError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let data = decode::<AccessClaims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_and_carries_user_id() {
        let keys = TokenKeys::from_secret(b"test-secret");
        let user_id = Uuid::new_v4();
        let token = keys
            .issue(&AccessClaims::new(user_id, "a@example.com", Duration::hours(1)))
            .unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "a@example.com");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let keys = TokenKeys::from_secret(b"one");
        let other = TokenKeys::from_secret(b"two");
        let token = keys
            .issue(&AccessClaims::new(Uuid::new_v4(), "a@example.com", Duration::hours(1)))
            .unwrap();

        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::from_secret(b"secret");
        let token = keys
            .issue(&AccessClaims::new(
                Uuid::new_v4(),
                "a@example.com",
                Duration::hours(-2),
            ))
            .unwrap();

        assert!(keys.verify(&token).is_err());
    }
}
