//! Identity provider capability.
//!
//! The free-usage counter and the subscription plan live with the external
//! identity provider, not in this service. Handlers only see this trait, so the
//! counter is an injected capability rather than process state.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::user::{Caller, Entitlement};

pub mod clerk;

pub use clerk::ClerkIdentity;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identity API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a bearer session token to the caller it belongs to.
    async fn authenticate(&self, token: &str) -> Result<Caller, IdentityError>;

    /// Reads the caller's current tier and free-usage counter.
    async fn entitlement(&self, user_id: &str) -> Result<Entitlement, IdentityError>;

    /// Overwrites the stored free-usage counter. Plain write, no compare-and-swap.
    async fn record_free_usage(&self, user_id: &str, free_usage: u32)
        -> Result<(), IdentityError>;
}
