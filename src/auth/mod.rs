use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SessionConfig;

/// Lifetime of the `state` round trip through the identity provider
pub const LOGIN_STATE_MINUTES: i64 = 10;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session signing error: {0}")]
    Signing(String),

    #[error("Invalid session token: {0}")]
    Invalid(String),
}

/// Claims carried by the signed session cookie
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: Uuid,
    pub sub: String,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

/// Principal attached to an incoming request once its cookie checks out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: String,
    pub user_name: String,
}

impl From<SessionClaims> for Session {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sid,
            user_id: claims.sub,
            user_name: claims.name,
        }
    }
}

/// Where to resume after the identity provider sends the user back.
/// Travels as the OAuth `state` parameter, signed with the session key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginState {
    pub redir: String,
    pub resource_id: Option<String>,
    pub nonce: Uuid,
    pub exp: i64,
}

impl LoginState {
    pub fn new(redir: String, resource_id: Option<String>) -> Self {
        Self {
            redir,
            resource_id,
            nonce: Uuid::new_v4(),
            exp: (Utc::now() + Duration::minutes(LOGIN_STATE_MINUTES)).timestamp(),
        }
    }
}

/// Signs and verifies session cookies and login state with one HS256 secret
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
    pub cookie_name: String,
    pub secure_cookie: bool,
}

impl SessionKeys {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl_hours: config.ttl_hours as i64,
            cookie_name: config.cookie_name.clone(),
            secure_cookie: config.secure_cookie,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_hours * 3600
    }

    pub fn issue(&self, session: &Session) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sid: session.id,
            sub: session.user_id.clone(),
            name: session.user_name.clone(),
            exp: (now + Duration::hours(self.ttl_hours)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Session, SessionError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())
            .map_err(|e| SessionError::Invalid(e.to_string()))?;

        Ok(token_data.claims.into())
    }

    pub fn issue_state(&self, state: &LoginState) -> Result<String, SessionError> {
        encode(&Header::default(), state, &self.encoding)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }

    pub fn verify_state(&self, token: &str) -> Result<LoginState, SessionError> {
        decode::<LoginState>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| SessionError::Invalid(e.to_string()))
    }
}
