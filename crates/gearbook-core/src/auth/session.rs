//! Bearer-token session with silent refresh and one-shot retry.
//!
//! The session owns the two persisted tokens (access, refresh) and wraps
//! arbitrary HTTP requests with automatic recovery from an expired access
//! token. The server is the sole authority on token validity: the client
//! only checks that a stored access token is non-empty and has the `.`
//! separator of a signed token, and otherwise treats a 401 as the expiry
//! signal.
//!
//! A 401 triggers at most one refresh-and-retry cycle per call. The bound
//! is deliberate: it prevents an infinite loop when the refresh endpoint
//! hands out tokens the data endpoints immediately reject.

use std::fmt;
use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::store::{TokenSlot, TokenStore};

/// Path of the token refresh endpoint, relative to the API base URL
const REFRESH_PATH: &str = "/api/v1/auth/token/refresh/";

#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable access token exists locally or via refresh; no request was
    /// made. The caller must run a login flow.
    #[error("authentication required")]
    AuthRequired,

    /// The HTTP transport failed before a response was produced. Never
    /// interpreted as an auth problem; stored credentials are untouched.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access: Option<String>,
}

/// Authenticated-request wrapper around a token store and an HTTP client.
///
/// Clone is cheap; clones share the same store and in-flight refresh gate,
/// so concurrent callers coalesce onto a single refresh request.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    http: Client,
    store: Arc<dyn TokenStore>,
    refresh_url: String,
    refresh_gate: Mutex<()>,
}

impl AuthSession {
    pub fn new(http: Client, store: Arc<dyn TokenStore>, base_url: &str) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                http,
                store,
                refresh_url: format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH),
                refresh_gate: Mutex::new(()),
            }),
        }
    }

    /// Structural validity only: non-empty and shaped like a signed token.
    fn is_well_formed(token: &str) -> bool {
        !token.is_empty() && token.contains('.')
    }

    /// The persisted access token, if structurally well-formed.
    /// No network call, no side effects.
    pub fn stored_access_token(&self) -> Option<String> {
        self.inner
            .store
            .get(TokenSlot::Access)
            .filter(|t| Self::is_well_formed(t))
    }

    /// The persisted refresh token, if non-empty. No side effects.
    pub fn stored_refresh_token(&self) -> Option<String> {
        self.inner
            .store
            .get(TokenSlot::Refresh)
            .filter(|t| !t.is_empty())
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// `Ok(None)` means the refresh produced nothing usable; in every such
    /// case other than "no refresh token stored", both credentials have
    /// been cleared. Transport errors propagate without touching storage.
    pub async fn refresh_access_token(&self) -> Result<Option<String>, AuthError> {
        let before = self.inner.store.get(TokenSlot::Access);
        let _gate = self.inner.refresh_gate.lock().await;

        // A concurrent caller may have completed a refresh while we waited
        // on the gate; adopt its token instead of spending our refresh.
        if let Some(current) = self.stored_access_token() {
            if before.as_deref() != Some(current.as_str()) {
                debug!("Adopting access token from concurrent refresh");
                return Ok(Some(current));
            }
        }

        let Some(refresh) = self.stored_refresh_token() else {
            return Ok(None);
        };

        debug!("Refreshing access token");
        let response = self
            .inner
            .http
            .post(&self.inner.refresh_url)
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Token refresh rejected, clearing credentials");
            self.clear_tokens();
            return Ok(None);
        }

        match response.json::<RefreshResponse>().await {
            Ok(RefreshResponse {
                access: Some(access),
            }) if !access.is_empty() => {
                self.inner.store.set(TokenSlot::Access, &access);
                debug!("Access token refreshed");
                Ok(Some(access))
            }
            Ok(_) => {
                warn!("Refresh response carried no access token, clearing credentials");
                self.clear_tokens();
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Unparseable refresh response, clearing credentials");
                self.clear_tokens();
                Ok(None)
            }
        }
    }

    /// The stored access token if structurally valid, otherwise whatever a
    /// refresh yields. The single entry point for callers that need a token
    /// before attempting a request by hand.
    pub async fn valid_access_token(&self) -> Result<Option<String>, AuthError> {
        if let Some(token) = self.stored_access_token() {
            return Ok(Some(token));
        }
        self.refresh_access_token().await
    }

    /// Send an authenticated request, recovering once from a 401.
    ///
    /// On a 401 the session refreshes and re-issues the request exactly
    /// once, returning whatever that produces (even another 401). If the
    /// refresh yields nothing, credentials are cleared and the original
    /// 401 is returned for the caller to treat as a dead session.
    pub async fn send_authorized(&self, request: RequestBuilder) -> Result<Response, AuthError> {
        self.send_inner(request, true).await
    }

    /// Send an authenticated request without the 401 recovery cycle.
    pub async fn send_authorized_once(
        &self,
        request: RequestBuilder,
    ) -> Result<Response, AuthError> {
        self.send_inner(request, false).await
    }

    async fn send_inner(
        &self,
        request: RequestBuilder,
        allow_retry: bool,
    ) -> Result<Response, AuthError> {
        let token = self
            .valid_access_token()
            .await?
            .ok_or(AuthError::AuthRequired)?;

        // Clone before the builder is consumed; requests with streaming
        // bodies cannot be replayed and settle for the first response.
        let replay = request.try_clone();
        let response = request.bearer_auth(&token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED || !allow_retry {
            return Ok(response);
        }

        let Some(replay) = replay else {
            return Ok(response);
        };

        match self.refresh_access_token().await? {
            Some(fresh) => Ok(replay.bearer_auth(&fresh).send().await?),
            None => {
                self.clear_tokens();
                Ok(response)
            }
        }
    }

    /// Persist a freshly issued token pair (login/signup).
    pub fn store_tokens(&self, access: &str, refresh: &str) {
        self.inner.store.set(TokenSlot::Access, access);
        self.inner.store.set(TokenSlot::Refresh, refresh);
    }

    /// Unconditionally remove both persisted tokens. Idempotent.
    pub fn clear_tokens(&self) {
        self.inner.store.remove(TokenSlot::Access);
        self.inner.store.remove(TokenSlot::Refresh);
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("refresh_url", &self.inner.refresh_url)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
