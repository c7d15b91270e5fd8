//! Credential resolution port

use async_trait::async_trait;
use relay_domain::Principal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer credential")]
    MissingCredential,

    #[error("Invalid bearer credential")]
    InvalidCredential,

    #[error("Credential backend unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a bearer token to the user and tenants it may act for.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Principal, AuthError>;
}
