//! API client for the gearbook asset-booking service.
//!
//! Inventory endpoints (assets, categories) are public; booking endpoints
//! require a bearer token and are routed through [`AuthSession`] so an
//! expired access token is refreshed and retried transparently.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{AuthSession, TokenStore};
use crate::models::{Asset, Booking, Category, NewBooking, SubCategory};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Cancellation reason used when the caller gives none.
const DEFAULT_CANCEL_REASON: &str = "Changed my mind";

#[derive(Debug, Deserialize)]
struct TokenPairResponse {
    access: String,
    refresh: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignupResponse {
    pub detail: String,
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailResponse {
    pub detail: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// API client for the asset-booking service.
/// Clone is cheap - reqwest::Client and the session share Arcs internally.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: AuthSession,
}

impl ApiClient {
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let session = AuthSession::new(http.clone(), store, &base_url);
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    /// Check if a response is successful, turning an error status plus body
    /// into a typed `ApiError`.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn authed_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T> {
        let response = self
            .session
            .send_authorized(request)
            .await
            .map_err(ApiError::from)?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    // ===== Authentication =====

    /// Exchange username/password for a token pair and persist it.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let url = self.url("auth/token/");
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({"username": username, "password": password}))
            .send()
            .await
            .context("Failed to send login request")?;
        let response = Self::check(response).await?;

        let tokens: TokenPairResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;
        self.session.store_tokens(&tokens.access, &tokens.refresh);
        debug!(username = %username, "Logged in");
        Ok(())
    }

    /// Drop the stored token pair. Client-side only; the refresh token is
    /// not revoked on the server.
    pub fn logout(&self) {
        self.session.clear_tokens();
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse> {
        let url = self.url("auth/signup/");
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .context("Failed to send signup request")?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .context("Failed to parse signup response")
    }

    pub async fn verify_email(&self, token: &str) -> Result<VerifyEmailResponse> {
        let url = self.url("auth/verify-email/");
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({"token": token}))
            .send()
            .await
            .context("Failed to send email verification request")?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .context("Failed to parse email verification response")
    }

    // ===== Inventory =====

    pub async fn fetch_assets(&self) -> Result<Vec<Asset>> {
        self.get_json("assets/").await
    }

    pub async fn fetch_asset(&self, id: i64) -> Result<Asset> {
        self.get_json(&format!("assets/{}/", id)).await
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.get_json("categories/").await
    }

    pub async fn fetch_subcategories(&self) -> Result<Vec<SubCategory>> {
        self.get_json("subcategories/").await
    }

    // ===== Bookings =====

    /// Fetch the caller's own bookings (the server scopes the list).
    pub async fn fetch_bookings(&self) -> Result<Vec<Booking>> {
        let url = self.url("bookings/");
        self.authed_json(self.http.get(&url), &url).await
    }

    /// Submit a booking request. Conflict detection is server-side; an
    /// overlapping window comes back as a validation error string.
    pub async fn create_booking(&self, booking: &NewBooking) -> Result<Booking> {
        booking.validate().map_err(ApiError::Validation)?;
        let url = self.url("bookings/");
        self.authed_json(self.http.post(&url).json(booking), &url)
            .await
    }

    /// Ask for a booking to be cancelled. The booking moves to
    /// `cancellation_requested` until staff approve it.
    pub async fn cancel_booking(&self, id: i64, reason: Option<&str>) -> Result<Booking> {
        let url = self.url(&format!("bookings/{}/cancel/", id));
        let reason = reason.unwrap_or(DEFAULT_CANCEL_REASON);
        self.authed_json(
            self.http.post(&url).json(&serde_json::json!({"reason": reason})),
            &url,
        )
        .await
    }

    /// Mark an accepted booking as received, with a handover photo.
    pub async fn receive_booking(&self, id: i64, image: &Path) -> Result<Booking> {
        self.upload_handover(&format!("bookings/{}/receive/", id), image)
            .await
    }

    /// Mark a received booking as returned, with a handover photo.
    pub async fn return_booking(&self, id: i64, image: &Path) -> Result<Booking> {
        self.upload_handover(&format!("bookings/{}/return_asset/", id), image)
            .await
    }

    // Multipart bodies cannot be replayed, so a 401 here skips the retry
    // and surfaces as a terminal auth failure.
    async fn upload_handover(&self, path: &str, image: &Path) -> Result<Booking> {
        let bytes = std::fs::read(image)
            .with_context(|| format!("Failed to read image {}", image.display()))?;
        let file_name = image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("handover.jpg")
            .to_string();
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for(image))
            .context("Failed to build image part")?;
        let form = multipart::Form::new().part("image", part);

        let url = self.url(path);
        let response = self
            .session
            .send_authorized(self.http.post(&url).multipart(form))
            .await
            .map_err(ApiError::from)?;
        let response = Self::check(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}

fn mime_for(image: &Path) -> &'static str {
    match image
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
