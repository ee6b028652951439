//! REST API client module for the asset-booking service.
//!
//! This module provides the `ApiClient` for browsing the asset inventory
//! and driving the booking lifecycle. Authenticated endpoints go through
//! the `AuthSession` wrapper, which handles bearer tokens, silent refresh,
//! and one-shot retry on authorization failure.

pub mod client;
pub mod error;

pub use client::{ApiClient, SignupRequest, SignupResponse, VerifyEmailResponse};
pub use error::ApiError;
