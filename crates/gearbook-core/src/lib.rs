//! Core library for gearbook, a client for a remote asset-booking service.
//!
//! The pieces:
//!
//! - [`auth`]: bearer-token session with silent refresh and one-shot retry,
//!   plus pluggable persistent token storage
//! - [`api`]: REST client for assets, categories, and booking lifecycle
//! - [`models`]: wire/domain types mirroring the service's serializers
//! - [`config`]: on-disk application configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, AuthSession};
