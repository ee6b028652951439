//! Authentication module for managing tokens and authorized requests.
//!
//! This module provides:
//! - `AuthSession`: bearer-token session with silent refresh and one-shot
//!   retry on authorization failure
//! - `TokenStore`: pluggable persistent storage for the access/refresh
//!   token pair (file, OS keychain, or in-memory)

pub mod session;
pub mod store;

pub use session::{AuthError, AuthSession};
pub use store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenSlot, TokenStore};
