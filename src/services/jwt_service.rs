/*!
 * JWT Service
 *
 * Mints and validates access/refresh token pairs. Both token kinds are
 * signed with the same HS256 secret and explicitly pinned to `Algorithm::HS256` on validation so a
 * token crafted with `alg: none` or an asymmetric algorithm is rejected
 * before signature verification ever runs (alg-confusion defense).
 */

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::UserRole;
use crate::utils::{AppError, Result};

/// JWT claims carried by both access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject — the user id
    pub sub: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    /// Opaque session identifier; the unit of logout/refresh revocation
    pub session_id: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Token pair returned to the client on login/refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// The session id embedded in both tokens, for blacklisting on logout/refresh
    pub session_id: String,
}

/// Minimal identity needed to mint a token pair.
pub struct TokenSubject<'a> {
    pub user_id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub role: UserRole,
}

#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    /// Mint a fresh access+refresh pair under a new session id.
    pub fn generate_tokens(&self, subject: &TokenSubject) -> Result<TokenPair> {
        let session_id = Uuid::new_v4().to_string();
        self.generate_tokens_for_session(subject, &session_id)
    }

    /// Mint a fresh pair under a caller-supplied session id. Used by
    /// `refresh_access_token` to rotate to a *new* session id while reusing
    /// this constructor.
    pub fn generate_tokens_for_session(
        &self,
        subject: &TokenSubject,
        session_id: &str,
    ) -> Result<TokenPair> {
        let access_token = self.generate_token(subject, session_id, TokenType::Access)?;
        let refresh_token = self.generate_token(subject, session_id, TokenType::Refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.config.access_token_hours * 3600,
            session_id: session_id.to_string(),
        })
    }

    fn generate_token(
        &self,
        subject: &TokenSubject,
        session_id: &str,
        token_type: TokenType,
    ) -> Result<String> {
        let now = Utc::now();
        let lifetime_hours = match token_type {
            TokenType::Access => self.config.access_token_hours,
            TokenType::Refresh => self.config.refresh_token_hours,
        };
        let expiry = now + Duration::hours(lifetime_hours);

        let claims = Claims {
            sub: subject.user_id.to_string(),
            username: subject.username.to_string(),
            email: subject.email.to_string(),
            role: subject.role,
            session_id: session_id.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            iss: self.config.issuer.clone(),
            token_type,
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(
            &header,
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Decode and verify a token, requiring HS256 explicitly (rejecting
    /// `alg: none` and any asymmetric algorithm outright) and distinguishing
    /// an expired signature from every other validation failure.
    fn decode_token(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.issuer.clone()]);
        validation.validate_exp = true;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            tracing::warn!("token validation failed: {:?}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::TokenInvalid,
            }
        })?;

        if token_data.claims.token_type != expected {
            return Err(AppError::TokenInvalid);
        }

        Ok(token_data.claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.decode_token(token, TokenType::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        self.decode_token(token, TokenType::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test_secret_key_minimum_32_characters_long_for_security".to_string(),
            access_token_hours: 24,
            refresh_token_hours: 168,
            issuer: "pharmacy-backend".to_string(),
        }
    }

    fn subject(role: UserRole) -> TokenSubject<'static> {
        TokenSubject {
            user_id: Uuid::new_v4(),
            username: "pharmacist1",
            email: "pharmacist1@example.com",
            role,
        }
    }

    #[test]
    fn test_generate_tokens() {
        let jwt_service = JwtService::new(test_jwt_config());
        let subj = subject(UserRole::Pharmacist);

        let tokens = jwt_service.generate_tokens(&subj).unwrap();
        assert!(!tokens.access_token.is_empty());
        assert!(!tokens.refresh_token.is_empty());
        assert_eq!(tokens.expires_in, 24 * 3600);
    }

    #[test]
    fn test_validate_access_token_success() {
        let jwt_service = JwtService::new(test_jwt_config());
        let subj = subject(UserRole::Admin);
        let user_id = subj.user_id;

        let tokens = jwt_service.generate_tokens(&subj).unwrap();
        let claims = jwt_service.validate_access_token(&tokens.access_token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.session_id, tokens.session_id);
    }

    #[test]
    fn test_validate_refresh_token_success() {
        let jwt_service = JwtService::new(test_jwt_config());
        let subj = subject(UserRole::Pharmacist);

        let tokens = jwt_service.generate_tokens(&subj).unwrap();
        let claims = jwt_service.validate_refresh_token(&tokens.refresh_token).unwrap();

        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_validate_access_token_invalid() {
        let jwt_service = JwtService::new(test_jwt_config());
        let result = jwt_service.validate_access_token("not-a-jwt-at-all");
        assert!(matches!(result, Err(AppError::TokenInvalid)));
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let jwt_service = JwtService::new(test_jwt_config());
        let subj = subject(UserRole::Pharmacist);
        let tokens = jwt_service.generate_tokens(&subj).unwrap();

        assert!(jwt_service.validate_access_token(&tokens.refresh_token).is_err());
        assert!(jwt_service.validate_refresh_token(&tokens.access_token).is_err());
    }

    #[test]
    fn test_expired_token_is_distinct_error() {
        let mut config = test_jwt_config();
        config.access_token_hours = 0;
        let jwt_service = JwtService::new(config);
        let subj = subject(UserRole::Pharmacist);
        let tokens = jwt_service.generate_tokens(&subj).unwrap();

        std::thread::sleep(std::time::Duration::from_secs(1));
        let result = jwt_service.validate_access_token(&tokens.access_token);
        assert!(matches!(result, Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let jwt_service = JwtService::new(test_jwt_config());
        let subj = subject(UserRole::Pharmacist);
        let tokens = jwt_service.generate_tokens(&subj).unwrap();

        let mut other_config = test_jwt_config();
        other_config.secret = "a_completely_different_secret_of_32+_chars".to_string();
        let other_service = JwtService::new(other_config);

        assert!(matches!(
            other_service.validate_access_token(&tokens.access_token),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_refresh_rotates_session_id() {
        let jwt_service = JwtService::new(test_jwt_config());
        let subj = subject(UserRole::Pharmacist);
        let first = jwt_service.generate_tokens(&subj).unwrap();

        let new_session_id = Uuid::new_v4().to_string();
        let rotated = jwt_service
            .generate_tokens_for_session(&subj, &new_session_id)
            .unwrap();

        assert_ne!(first.session_id, rotated.session_id);
    }
}
