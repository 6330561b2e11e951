use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::error::Result;

/// A bearer token pair with its expiry instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token attached to API requests
    #[serde(rename = "access_token")]
    pub access_token: String,

    /// Refresh token for renewing the access token, if the server issued one
    #[serde(rename = "refresh_token", skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type (always "Bearer")
    #[serde(rename = "token_type", default = "bearer")]
    pub token_type: String,

    /// Instant at which the access token stops being valid
    pub expires_at: DateTime<Utc>,
}

fn bearer() -> String {
    "Bearer".to_string()
}

impl TokenSet {
    /// Create a new token set expiring `expires_in` seconds from now
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: i64) -> Self {
        TokenSet {
            access_token,
            refresh_token,
            token_type: bearer(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    /// Check if the access token expires within the given margin
    pub fn expires_within(&self, margin: Duration) -> bool {
        Utc::now() + margin >= self.expires_at
    }

    /// Check if the access token has already expired
    pub fn is_expired(&self) -> bool {
        self.expires_within(Duration::zero())
    }

    /// Check if a refresh token is available
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Process-wide authentication state, observable through
/// [`TokenProvider::auth_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No token held (before login, or after logout)
    #[default]
    Unauthenticated,
    /// A token set is held and renewable
    Authenticated,
    /// Silent renewal failed; the application must re-authenticate the user
    RequiresReauthentication,
}

/// Capability that actually obtains tokens from the authorization server.
///
/// `refresh` exchanges a refresh token for a new token set. `login` runs the
/// full (interactive) authentication flow; how that flow is presented is the
/// embedding application's concern, not this crate's.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Exchange a refresh token for a new token set
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet>;

    /// Run the full authentication flow from scratch
    async fn login(&self) -> Result<TokenSet>;
}

/// Produces a currently valid bearer token on demand.
///
/// The provider refreshes the held token just in time (when it is within a
/// short validity margin of expiry) and falls back to the source's `login`
/// flow when the refresh fails. Refresh failures never propagate to the
/// caller; the terminal outcome is an observable transition to
/// [`AuthState::RequiresReauthentication`] and an unauthenticated request
/// the server will reject.
///
/// The held token set is the only mutable state and is owned exclusively by
/// the provider. All of `get_access_token` runs under one async lock, so
/// concurrent callers during a renewal wait for it and observe the renewed
/// token instead of starting a second refresh or login flow.
pub struct TokenProvider {
    source: Arc<dyn TokenSource>,
    tokens: Mutex<Option<TokenSet>>,
    margin: Duration,
    state: watch::Sender<AuthState>,
}

impl TokenProvider {
    /// Default validity margin below which the token is refreshed
    pub const REFRESH_MARGIN_SECS: i64 = 5;

    /// Create a provider around a token source
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        TokenProvider {
            source,
            tokens: Mutex::new(None),
            margin: Duration::seconds(Self::REFRESH_MARGIN_SECS),
            state: watch::channel(AuthState::default()).0,
        }
    }

    /// Set the validity margin below which a refresh is attempted
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Install a token set obtained by the application's login flow
    pub async fn set_token_set(&self, tokens: TokenSet) {
        *self.tokens.lock().await = Some(tokens);
        self.transition(AuthState::Authenticated);
    }

    /// Drop the held token set (logout)
    pub async fn clear(&self) {
        *self.tokens.lock().await = None;
        self.transition(AuthState::Unauthenticated);
    }

    /// Get a snapshot of the held token set
    pub async fn token_set(&self) -> Option<TokenSet> {
        self.tokens.lock().await.clone()
    }

    /// Watch the authentication state.
    ///
    /// The receiver observes the transition to
    /// [`AuthState::RequiresReauthentication`] exactly once per failure, so
    /// the embedding application can present its re-login affordance.
    pub fn auth_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Get a currently valid access token, refreshing if necessary.
    ///
    /// Returns `None` when no token can be produced; the request is still
    /// issued unauthenticated and the server answers 401. An empty access
    /// token counts as absent, so `Authorization: Bearer` is never sent
    /// with an empty value.
    pub async fn get_access_token(&self) -> Option<String> {
        let mut tokens = self.tokens.lock().await;

        // A pending re-authentication is resolved by the application, not
        // by piling up further login attempts from concurrent calls.
        if *self.state.borrow() == AuthState::RequiresReauthentication {
            return usable_token(&tokens);
        }

        let held = match tokens.as_ref() {
            None => return None,
            Some(held) if !held.expires_within(self.margin) => {
                return usable_token(&tokens);
            }
            Some(held) => held.clone(),
        };

        match self.renew(&held).await {
            Some(renewed) => {
                *tokens = Some(renewed);
                self.transition(AuthState::Authenticated);
                usable_token(&tokens)
            }
            None => {
                self.transition(AuthState::RequiresReauthentication);
                usable_token(&tokens)
            }
        }
    }

    /// Renew the held token set, falling back to the login flow once.
    async fn renew(&self, held: &TokenSet) -> Option<TokenSet> {
        match held.refresh_token.as_deref().filter(|t| !t.is_empty()) {
            Some(refresh_token) => match self.source.refresh(refresh_token).await {
                Ok(renewed) => return Some(renewed),
                Err(err) => {
                    warn!(error = %err, "token refresh failed, falling back to login");
                }
            },
            None => debug!("no refresh token held, falling back to login"),
        }

        match self.source.login().await {
            Ok(renewed) => Some(renewed),
            Err(err) => {
                warn!(error = %err, "login fallback failed");
                None
            }
        }
    }

    fn transition(&self, next: AuthState) {
        let changed = self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed && next == AuthState::RequiresReauthentication {
            warn!("session renewal failed; re-authentication required");
        }
    }
}

/// The held access token, if it is non-empty and not yet expired.
fn usable_token(tokens: &Option<TokenSet>) -> Option<String> {
    tokens
        .as_ref()
        .filter(|t| !t.is_expired() && !t.access_token.is_empty())
        .map(|t| t.access_token.clone())
}
