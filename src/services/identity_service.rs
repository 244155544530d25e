//! Bearer token identity resolution

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::JwtConfig,
    error::{AppError, AppResult},
    models::Principal,
};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies HS256 tokens carrying a principal
#[derive(Clone)]
pub struct IdentityService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_hours: i64,
}

impl IdentityService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            expiry_hours: config.expiry_hours,
        }
    }

    /// Issue a token for `principal`, returning it with its lifetime in seconds
    pub fn issue_token(&self, principal: &Principal) -> AppResult<(String, i64)> {
        let now = Utc::now();
        let expires_in = Duration::hours(self.expiry_hours);

        let claims = Claims {
            sub: principal.id.to_string(),
            name: principal.display_name.clone(),
            exp: (now + expires_in).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign token: {}", e)))?;

        Ok((token, expires_in.num_seconds()))
    }

    /// Verify a token and resolve the principal it names
    pub fn verify_token(&self, token: &str) -> AppResult<Principal> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::InvalidToken)?;
        Ok(Principal::new(id, data.claims.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(expiry_hours: i64) -> IdentityService {
        IdentityService::new(&JwtConfig {
            secret: "test-secret".to_string(),
            expiry_hours,
        })
    }

    #[test]
    fn test_issued_token_resolves_principal() {
        let identity = service(1);
        let alice = Principal::new(Uuid::new_v4(), "alice");

        let (token, expires_in) = identity.issue_token(&alice).unwrap();

        assert_eq!(expires_in, 3600);
        assert_eq!(identity.verify_token(&token).unwrap(), alice);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Past the default 60s leeway
        let identity = service(-1);
        let (token, _) = identity
            .issue_token(&Principal::new(Uuid::new_v4(), "bob"))
            .unwrap();

        assert!(matches!(identity.verify_token(&token), Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let (token, _) = service(1)
            .issue_token(&Principal::new(Uuid::new_v4(), "carol"))
            .unwrap();
        let other = IdentityService::new(&JwtConfig {
            secret: "another-secret".to_string(),
            expiry_hours: 1,
        });

        assert!(matches!(other.verify_token(&token), Err(AppError::InvalidToken)));
        assert!(matches!(other.verify_token("garbage"), Err(AppError::InvalidToken)));
    }
}
