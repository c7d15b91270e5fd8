//! Bearer tokens declared in configuration (`[[auth.tokens]]`).

use crate::config::FileTokenConfig;
use async_trait::async_trait;
use relay_application::ports::credentials::{AuthError, CredentialResolver};
use relay_domain::{Principal, TenantId};
use std::collections::HashMap;
use tracing::debug;

pub struct StaticTokenResolver {
    principals: HashMap<String, Principal>,
}

impl StaticTokenResolver {
    pub fn new(principals: HashMap<String, Principal>) -> Self {
        Self { principals }
    }

    pub fn from_config(tokens: &[FileTokenConfig]) -> Self {
        let principals = tokens
            .iter()
            .filter(|entry| !entry.token.trim().is_empty())
            .map(|entry| {
                let tenants = entry.tenants.iter().map(TenantId::new).collect();
                (
                    entry.token.clone(),
                    Principal::new(entry.user_id.as_str(), tenants),
                )
            })
            .collect();
        Self { principals }
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

#[async_trait]
impl CredentialResolver for StaticTokenResolver {
    async fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        match self.principals.get(token) {
            Some(principal) => {
                debug!(user = %principal.user_id, "Resolved bearer token");
                Ok(principal.clone())
            }
            None => Err(AuthError::InvalidCredential),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(token: &str, user: &str, tenants: &[&str]) -> FileTokenConfig {
        FileTokenConfig {
            token: token.to_string(),
            user_id: user.to_string(),
            tenants: tenants.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_resolves_configured_tokens() {
        let resolver = StaticTokenResolver::from_config(&[
            token("abc", "jane", &["store-1", "store-2"]),
            token("", "ghost", &["store-9"]),
        ]);
        assert_eq!(resolver.len(), 1);

        let principal = resolver.resolve("abc").await.unwrap();
        assert_eq!(principal.user_id.as_str(), "jane");
        assert!(principal.can_access(&TenantId::new("store-2")));
        assert!(!principal.can_access(&TenantId::new("store-9")));

        assert_eq!(
            resolver.resolve("nope").await,
            Err(AuthError::InvalidCredential)
        );
        assert_eq!(resolver.resolve("").await, Err(AuthError::InvalidCredential));
    }
}
