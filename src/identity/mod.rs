// identity/mod.rs - Identity accessor contract
//
// The gateway never talks to the identity provider itself. It asks an
// IdentityAccessor two questions about the incoming request: is someone signed
// in, and is there a usable token for a given downstream resource.

use async_trait::async_trait;
use std::fmt;

use crate::auth::Session;

pub mod cache;
pub mod issuer;
pub mod session_identity;

pub use cache::{CachedToken, TokenCache};
pub use issuer::{IssuedToken, IssuerError, OAuthTokenIssuer, Principal, TokenIssuer};
pub use session_identity::SessionIdentity;

/// What the identity layer needs to know about one incoming request
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    /// Path (and query) the caller asked for; used as the post-login return address
    pub path: String,
    pub session: Option<Session>,
}

impl RequestContext {
    pub fn new(path: impl Into<String>, session: Option<Session>) -> Self {
        Self {
            path: path.into(),
            session,
        }
    }
}

/// Opaque bearer token for a downstream resource. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Outcome of asking for a resource-scoped token
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenState {
    Valid(AccessToken),
    /// Nothing cached and nothing could be acquired silently
    Absent,
    /// A token existed but lapsed and could not be renewed
    Expired,
}

#[async_trait]
pub trait IdentityAccessor: Send + Sync {
    fn is_authenticated(&self, ctx: &RequestContext) -> bool;

    async fn get_access_token(&self, ctx: &RequestContext, resource_id: &str) -> TokenState;
}

/// Accessor that always answers with one pre-acquired token.
/// Used by the command-line client, which receives its token as an argument.
pub struct StaticIdentity {
    token: AccessToken,
}

impl StaticIdentity {
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl IdentityAccessor for StaticIdentity {
    fn is_authenticated(&self, _ctx: &RequestContext) -> bool {
        true
    }

    async fn get_access_token(&self, _ctx: &RequestContext, _resource_id: &str) -> TokenState {
        TokenState::Valid(self.token.clone())
    }
}
