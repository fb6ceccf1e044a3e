//! JWT access token issuance and verification
//!
//! Tokens carry the subject email and the superadmin flag as it was at
//! issuance. Verification is purely cryptographic: no storage lookup happens
//! here, so a privilege change never alters an outstanding token.

use crate::{config::AppConfig, error::AppError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity and privilege data a caller asks to embed in a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub sub: String,
    pub is_superadmin: bool,
}

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,

    /// Superadmin flag captured at issuance
    pub is_superadmin: bool,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

impl Claims {
    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            sub: self.sub.clone(),
            is_superadmin: self.is_superadmin,
        }
    }
}

/// Token verification failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature or structure is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => AppError::InvalidToken,
            TokenError::Expired => AppError::ExpiredToken,
        }
    }
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_exp: Duration,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            config.security.jwt_secret.expose_secret(),
            config.security.access_token_exp_secs,
        )
    }

    pub fn new(secret: &str, access_token_exp_secs: u64) -> Result<Self, AppError> {
        // Ensure secret is at least 32 bytes for HS256
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        let access_token_exp = i64::try_from(access_token_exp_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                AppError::Config(format!(
                    "Access token lifetime out of range: {}s",
                    access_token_exp_secs
                ))
            })?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_token_exp,
        })
    }

    /// Issue an access token, expiring after `expiry` or the configured default
    pub fn create_access_token(
        &self,
        subject: &TokenSubject,
        expiry: Option<Duration>,
    ) -> Result<String, AppError> {
        self.create_access_token_at(subject, Utc::now(), expiry)
    }

    /// Issue an access token as if the clock read `now`
    pub fn create_access_token_at(
        &self,
        subject: &TokenSubject,
        now: DateTime<Utc>,
        expiry: Option<Duration>,
    ) -> Result<String, AppError> {
        let expiry = expiry.unwrap_or(self.access_token_exp);
        let expiration = now.checked_add_signed(expiry).ok_or_else(|| {
            AppError::Internal(format!("Token expiry overflows the clock: {}", expiry))
        })?;

        let claims = Claims {
            sub: subject.sub.clone(),
            is_superadmin: subject.is_superadmin,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::Internal(format!("Failed to encode access token: {}", e))
        })
    }

    /// Validate and decode token
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                }
            })
    }
}
