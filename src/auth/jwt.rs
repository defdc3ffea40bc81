//! JWT token generation and validation

use crate::core::error::{GatewayError, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub exp: usize,
}

/// Generate an HS256 token for `username`, valid for `ttl_days`
pub fn generate_token(username: &str, secret: &str, ttl_days: i64) -> Result<String> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::days(ttl_days))
        .ok_or_else(|| {
            GatewayError::AuthenticationError("Failed to calculate expiration".to_string())
        })?
        .timestamp() as usize;

    let claims = Claims {
        sub: username.to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| GatewayError::AuthenticationError(format!("Failed to generate token: {}", e)))
}

/// Validate a JWT token and extract claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| GatewayError::AuthenticationError(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_carries_username() {
        let token = generate_token("alice", "secret", 7).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "alice");
        assert!(claims.exp as i64 > chrono::Utc::now().timestamp());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_token("alice", "secret", 7).unwrap();
        assert!(matches!(
            validate_token(&token, "other"),
            Err(GatewayError::AuthenticationError(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = generate_token("alice", "secret", -2).unwrap();
        assert!(validate_token(&token, "secret").is_err());
    }
}
