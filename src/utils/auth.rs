use crate::models::OwnerScope;
use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // owner scope id
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    pub exp: usize,
    pub jti: String,
}

impl From<Claims> for OwnerScope {
    fn from(claims: Claims) -> Self {
        OwnerScope {
            id: claims.sub,
            first_name: claims.given_name.unwrap_or_default(),
            last_name: claims.family_name.unwrap_or_default(),
        }
    }
}

pub fn create_jwt(owner: &OwnerScope, secret: &str, valid_for: Duration) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(valid_for)
        .ok_or_else(|| anyhow::anyhow!("Token expiry out of range"))?
        .timestamp();

    let claims = Claims {
        sub: owner.id.clone(),
        given_name: Some(owner.first_name.clone()),
        family_name: Some(owner.last_name.clone()),
        exp: expiration as usize,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims> {
    // Expiry is exact; resolved sessions are cut off at `exp` as well
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_cycle() {
        let secret = "test_secret";
        let owner = OwnerScope::new("user_123", "Ada", "Lovelace");
        let token = create_jwt(&owner, secret, Duration::hours(1)).unwrap();
        let claims = validate_jwt(&token, secret).unwrap();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(OwnerScope::from(claims), owner);
    }

    #[test]
    fn test_jwt_rejects_expired_token() {
        let owner = OwnerScope::new("user_123", "Ada", "Lovelace");
        let token = create_jwt(&owner, "secret", Duration::seconds(-5)).unwrap();
        assert!(validate_jwt(&token, "secret").is_err());
    }

    #[test]
    fn test_jwt_rejects_wrong_secret() {
        let owner = OwnerScope::new("user_123", "Ada", "Lovelace");
        let token = create_jwt(&owner, "one", Duration::hours(1)).unwrap();
        assert!(validate_jwt(&token, "two").is_err());
    }
}
