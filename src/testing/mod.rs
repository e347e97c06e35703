// Test doubles shared by unit tests across modules

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;
use uuid::Uuid;

use crate::auth::Session;
use crate::config::UpstreamConfig;
use crate::identity::{
    AccessToken, IdentityAccessor, IssuedToken, IssuerError, RequestContext, TokenIssuer, TokenState,
};

pub fn session() -> Session {
    Session {
        id: Uuid::new_v4(),
        user_id: "8d1c0f44".to_string(),
        user_name: "Neil Armstrong".to_string(),
    }
}

pub fn issued(access_token: &str, expires_in: u64) -> IssuedToken {
    IssuedToken {
        access_token: access_token.to_string(),
        refresh_token: None,
        expires_in,
        id_token: None,
    }
}

pub fn upstream_config(endpoint: &str) -> UpstreamConfig {
    UpstreamConfig {
        endpoint: Some(Url::parse(endpoint).expect("test endpoint")),
        resource_id: "https://contoso.sharepoint.com".to_string(),
        timeout_secs: 5,
    }
}

/// Identity accessor with a fixed answer, counting token lookups
pub struct StubIdentity {
    authenticated: bool,
    token: TokenState,
    lookups: AtomicUsize,
}

impl StubIdentity {
    pub fn anonymous() -> Self {
        Self::new(false, TokenState::Absent)
    }

    pub fn new(authenticated: bool, token: TokenState) -> Self {
        Self {
            authenticated,
            token,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityAccessor for StubIdentity {
    fn is_authenticated(&self, _ctx: &RequestContext) -> bool {
        self.authenticated
    }

    async fn get_access_token(&self, _ctx: &RequestContext, _resource_id: &str) -> TokenState {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.token.clone()
    }
}

/// Token issuer that answers refreshes from memory
pub struct FakeIssuer {
    access_token: Option<String>,
    refreshes: AtomicUsize,
}

impl FakeIssuer {
    pub fn succeeding(access_token: &str) -> Self {
        Self {
            access_token: Some(access_token.to_string()),
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            access_token: None,
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn refresh_calls(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    fn answer(&self) -> Result<IssuedToken, IssuerError> {
        match &self.access_token {
            Some(token) => Ok(issued(token, 3600)),
            None => Err(IssuerError::Rejected {
                status: 400,
                error: "invalid_grant".to_string(),
            }),
        }
    }
}

#[async_trait]
impl TokenIssuer for FakeIssuer {
    fn authorize_url(&self, resource_id: &str, state: &str) -> Url {
        let mut url = Url::parse("https://login.example.com/authorize").expect("static url");
        url.query_pairs_mut()
            .append_pair("resource", resource_id)
            .append_pair("state", state);
        url
    }

    async fn redeem_code(&self, _code: &str, _resource_id: &str) -> Result<IssuedToken, IssuerError> {
        self.answer()
    }

    async fn refresh(&self, _refresh_token: &str, _resource_id: &str) -> Result<IssuedToken, IssuerError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.answer()
    }
}

pub fn valid(token: &str) -> TokenState {
    TokenState::Valid(AccessToken::new(token))
}
