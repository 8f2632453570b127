//! Session cookie tokens
//!
//! The session id travels in a signed JWT so a client cannot forge or swap
//! session identifiers. The token carries no other state.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Session id (server-side store key).
    pub sid: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl SessionTokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Issue a signed token for a session id.
    pub fn issue(&self, session_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = SessionClaims {
            sid: session_id.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_secs as i64)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Validate a token and extract its claims.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> SessionTokenService {
        SessionTokenService::new("test_secret_key_32_bytes_long!!", 3600)
    }

    #[test]
    fn test_issue_and_validate() {
        let service = create_test_service();
        let token = service.issue("session-123").unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.sid, "session-123");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let service = create_test_service();
        assert!(service.validate("invalid.token.here").is_err());
        assert!(service.validate("").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service1 = create_test_service();
        let service2 = SessionTokenService::new("different_secret_key_32_bytes!!", 3600);

        let token = service1.issue("session-123").unwrap();
        assert!(service2.validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = create_test_service();

        // Claims expired beyond the default validation leeway.
        let now = Utc::now();
        let claims = SessionClaims {
            sid: "session-123".to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };

        let encoding_key = EncodingKey::from_secret(b"test_secret_key_32_bytes_long!!");
        let token = encode(&Header::default(), &claims, &encoding_key).unwrap();

        assert!(service.validate(&token).is_err());
    }
}
