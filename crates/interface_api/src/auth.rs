//! Authentication and authorization
//!
//! Access and refresh tokens are both HS256 JWTs, signed with distinct
//! secrets and tagged with their [`TokenType`] so one can never stand in for
//! the other.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use core_kernel::{ShopId, UserId};
use domain_warranty::{User, UserRole};

use crate::config::ApiConfig;

/// Which of the pair a token is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: UserId,
    pub username: String,
    pub role: UserRole,
    /// Owning shop of a shop login
    pub shop_id: Option<ShopId>,
    pub token_type: TokenType,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
    /// Unique token identifier
    pub jti: String,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or malformed Authorization header")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Expected a {0:?} token")]
    WrongTokenType(TokenType),
    #[error("{0}")]
    Forbidden(String),
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// An access/refresh token pair
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Signs and verifies tokens with secrets injected from [`ApiConfig`]
#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            access_secret: config.jwt_access_secret.clone(),
            refresh_secret: config.jwt_refresh_secret.clone(),
            access_ttl: Duration::minutes(config.jwt_access_expiry_mins),
            refresh_ttl: Duration::days(config.jwt_refresh_expiry_days),
        }
    }

    /// Issues a fresh access/refresh pair for `user`
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.sign(user, TokenType::Access)?,
            refresh_token: self.sign(user, TokenType::Refresh)?,
            token_type: "Bearer",
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Validates an access token
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, TokenType::Access)
    }

    /// Validates a refresh token
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, TokenType::Refresh)
    }

    fn secret(&self, token_type: TokenType) -> &[u8] {
        match token_type {
            TokenType::Access => self.access_secret.as_bytes(),
            TokenType::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    fn sign(&self, user: &User, token_type: TokenType) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            shop_id: user.shop_id,
            token_type,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(token_type)),
        )
        .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(expected)),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        if token_data.claims.token_type != expected {
            return Err(AuthError::WrongTokenType(expected));
        }
        Ok(token_data.claims)
    }
}

/// Checks that the caller is a head-office administrator
pub fn require_admin(claims: &Claims) -> Result<(), AuthError> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(AuthError::Forbidden(
            "administrator role required".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: UserId::new(7),
            shop_id: Some(ShopId::new(3)),
            username: "jh01".into(),
            role,
            password_hash: String::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pair_round_trip() {
        let issuer = TokenIssuer::new(&ApiConfig::default());
        let pair = issuer.issue_pair(&user(UserRole::ShopAdmin)).unwrap();
        assert_eq!(pair.expires_in, 15 * 60);

        let access = issuer.verify_access(&pair.access_token).unwrap();
        assert_eq!(access.sub, UserId::new(7));
        assert_eq!(access.shop_id, Some(ShopId::new(3)));
        assert_eq!(access.token_type, TokenType::Access);

        let refresh = issuer.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let issuer = TokenIssuer::new(&ApiConfig::default());
        let pair = issuer.issue_pair(&user(UserRole::Admin)).unwrap();
        assert!(issuer.verify_access(&pair.refresh_token).is_err());
        assert!(issuer.verify_refresh(&pair.access_token).is_err());
    }

    #[test]
    fn test_shared_secret_still_checks_type() {
        let config = ApiConfig {
            jwt_refresh_secret: "shared".into(),
            jwt_access_secret: "shared".into(),
            ..ApiConfig::default()
        };
        let issuer = TokenIssuer::new(&config);
        let pair = issuer.issue_pair(&user(UserRole::Admin)).unwrap();
        assert!(matches!(
            issuer.verify_access(&pair.refresh_token),
            Err(AuthError::WrongTokenType(TokenType::Access))
        ));
    }

    #[test]
    fn test_expired_token() {
        let config = ApiConfig {
            jwt_access_expiry_mins: -10,
            ..ApiConfig::default()
        };
        let issuer = TokenIssuer::new(&config);
        let pair = issuer.issue_pair(&user(UserRole::Admin)).unwrap();
        assert!(matches!(
            issuer.verify_access(&pair.access_token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_require_admin() {
        let issuer = TokenIssuer::new(&ApiConfig::default());
        let shop = issuer
            .verify_access(&issuer.issue_pair(&user(UserRole::ShopAdmin)).unwrap().access_token)
            .unwrap();
        assert!(require_admin(&shop).is_err());
    }
}
