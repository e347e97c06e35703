use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::{AccessToken, CachedToken, IdentityAccessor, RequestContext, TokenCache, TokenIssuer, TokenState};

/// Identity accessor backed by the signed session cookie and the token cache.
/// Renews lapsed or missing tokens silently when the session holds a refresh token.
pub struct SessionIdentity {
    cache: TokenCache,
    issuer: Arc<dyn TokenIssuer>,
}

impl SessionIdentity {
    pub fn new(cache: TokenCache, issuer: Arc<dyn TokenIssuer>) -> Self {
        Self { cache, issuer }
    }

    async fn renew(&self, session_id: Uuid, resource_id: &str, refresh_token: &str) -> Option<AccessToken> {
        match self.issuer.refresh(refresh_token, resource_id).await {
            Ok(issued) => {
                let cached = CachedToken::from_issued(&issued, Utc::now());
                let token = cached.access_token.clone();
                self.cache.store(session_id, resource_id, cached).await;
                tracing::debug!("silently renewed token for resource {}", resource_id);
                Some(token)
            }
            Err(e) => {
                tracing::warn!("silent token renewal for resource {} failed: {}", resource_id, e);
                None
            }
        }
    }
}

#[async_trait]
impl IdentityAccessor for SessionIdentity {
    fn is_authenticated(&self, ctx: &RequestContext) -> bool {
        ctx.session.is_some()
    }

    async fn get_access_token(&self, ctx: &RequestContext, resource_id: &str) -> TokenState {
        let Some(session) = ctx.session.as_ref() else {
            return TokenState::Absent;
        };

        match self.cache.get(session.id, resource_id).await {
            Some(cached) if !cached.is_expired(Utc::now()) => TokenState::Valid(cached.access_token),
            Some(cached) => {
                let renewed = match cached.refresh_token.as_deref() {
                    Some(refresh_token) => self.renew(session.id, resource_id, refresh_token).await,
                    None => None,
                };
                renewed.map(TokenState::Valid).unwrap_or(TokenState::Expired)
            }
            None => {
                let renewed = match self.cache.any_refresh_token(session.id).await {
                    Some(refresh_token) => self.renew(session.id, resource_id, &refresh_token).await,
                    None => None,
                };
                renewed.map(TokenState::Valid).unwrap_or(TokenState::Absent)
            }
        }
    }
}
