use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccessToken, IssuedToken};

/// Tokens this close to expiry are treated as already expired
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// Session lifetime used when the cache is not told the cookie TTL
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Clone, Debug)]
pub struct CachedToken {
    pub access_token: AccessToken,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Lifetimes too large to represent are clamped to the far future
    pub fn from_issued(issued: &IssuedToken, now: DateTime<Utc>) -> Self {
        let lifetime = i64::try_from(issued.expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);

        Self {
            access_token: AccessToken::new(issued.access_token.clone()),
            refresh_token: issued.refresh_token.clone(),
            expires_at: later(now, lifetime),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        later(now, Duration::seconds(EXPIRY_SKEW_SECONDS)) >= self.expires_at
    }
}

fn later(now: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    now.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug)]
struct SessionTokens {
    tokens: HashMap<String, CachedToken>,
    /// Pushed forward on every store, in step with the reissued cookie
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CacheState {
    sessions: HashMap<Uuid, SessionTokens>,
    /// Signed-out sessions whose cookies may still verify, until the given time
    revoked: HashMap<Uuid, DateTime<Utc>>,
}

impl CacheState {
    fn sweep(&mut self, now: DateTime<Utc>) {
        self.sessions.retain(|_, session| session.expires_at > now);
        self.revoked.retain(|_, until| *until > now);
    }

    fn live(&self, session_id: Uuid, now: DateTime<Utc>) -> Option<&SessionTokens> {
        self.sessions
            .get(&session_id)
            .filter(|session| session.expires_at > now)
    }
}

/// Session-backed token store: session id -> resource id -> token.
/// Sessions idle longer than the session TTL are dropped on the next store.
#[derive(Clone)]
pub struct TokenCache {
    state: Arc<RwLock<CacheState>>,
    session_ttl: Duration,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(DEFAULT_SESSION_TTL_HOURS))
    }
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(session_ttl: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(CacheState::default())),
            session_ttl,
        }
    }

    pub async fn get(&self, session_id: Uuid, resource_id: &str) -> Option<CachedToken> {
        let state = self.state.read().await;
        state
            .live(session_id, Utc::now())
            .and_then(|session| session.tokens.get(resource_id))
            .cloned()
    }

    pub async fn store(&self, session_id: Uuid, resource_id: &str, token: CachedToken) {
        let now = Utc::now();
        let mut state = self.state.write().await;
        state.sweep(now);

        if state.revoked.contains_key(&session_id) {
            tracing::debug!("not caching token for signed-out session {}", session_id);
            return;
        }

        let expires_at = later(now, self.session_ttl);
        let session = state.sessions.entry(session_id).or_insert_with(|| SessionTokens {
            tokens: HashMap::new(),
            expires_at,
        });
        session.expires_at = expires_at;
        session.tokens.insert(resource_id.to_string(), token);
    }

    /// Any refresh token held by the session. The identity provider accepts a
    /// refresh token issued for one resource when asking for another.
    pub async fn any_refresh_token(&self, session_id: Uuid) -> Option<String> {
        let state = self.state.read().await;
        state
            .live(session_id, Utc::now())?
            .tokens
            .values()
            .find_map(|token| token.refresh_token.clone())
    }

    /// Forget the session's tokens and refuse its cookie until the cookie
    /// could no longer verify anyway
    pub async fn revoke(&self, session_id: Uuid) {
        let now = Utc::now();
        let mut state = self.state.write().await;
        state.sweep(now);
        state.sessions.remove(&session_id);
        state.revoked.insert(session_id, later(now, self.session_ttl));
    }

    pub async fn is_revoked(&self, session_id: Uuid) -> bool {
        let state = self.state.read().await;
        state
            .revoked
            .get(&session_id)
            .is_some_and(|until| *until > Utc::now())
    }

    /// Drop sessions and revocations that have lapsed by `now`
    pub async fn sweep(&self, now: DateTime<Utc>) {
        self.state.write().await.sweep(now);
    }

    /// Sessions currently holding tokens
    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }
}
