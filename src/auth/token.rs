use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::UserRole;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the username.
    pub sub: String,
    pub role: UserRole,
    /// Expiration timestamp (seconds since epoch) for the token.
    pub exp: usize,
}

/// Signs and verifies HS256 tokens with the configured secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_hours: i64,
}

impl TokenService {
    pub fn new(secret: &str, expiration_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_hours,
        }
    }

    /// Generates a token for `username` carrying its role.
    ///
    /// # Returns
    /// `AppError::InternalServerError` if the expiration overflows or encoding fails.
    pub fn generate(&self, username: &str, role: UserRole) -> Result<String, AppError> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::hours(self.expiration_hours))
            .ok_or_else(|| AppError::InternalServerError("Invalid token expiration".into()))?
            .timestamp() as usize;

        let claims = Claims {
            sub: username.to_string(),
            role,
            exp: expiration,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token's signature and expiration and decodes its claims.
    ///
    /// Returns `AppError::Unauthorized` if the token is malformed, its signature
    /// is invalid, or it has expired.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation_and_verification() {
        let tokens = TokenService::new("test_secret_for_gen_verify", 24);
        let token = tokens.generate("alice", UserRole::Admin).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn test_token_expiration() {
        let tokens = TokenService::new("test_secret_for_expiration", -2);
        let expired_token = tokens.generate("alice", UserRole::Common).unwrap();

        match tokens.verify(&expired_token) {
            Err(AppError::Unauthorized(msg)) => {
                assert!(msg.contains("ExpiredSignature"), "unexpected message: {}", msg)
            }
            other => panic!("Token should have been rejected as expired: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_token_signature() {
        let signer = TokenService::new("one_secret", 24);
        let verifier = TokenService::new("a_completely_different_secret", 24);
        let token = signer.generate("alice", UserRole::Common).unwrap();

        match verifier.verify(&token) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("InvalidSignature")),
            other => panic!("Token should have been rejected: {:?}", other),
        }
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let tokens = TokenService::new("secret", 24);
        assert!(matches!(
            tokens.verify("not.a.token"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
