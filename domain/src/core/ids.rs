//! Identifier newtypes shared across subdomains.
//!
//! Every identifier is an opaque string. Ids minted by the engine itself
//! (traces, spans, conversations) are random UUIDv4 strings; ids that come
//! from outside (tenants, users, agents) are taken verbatim.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! generated_id {
    ($name:ident) => {
        impl $name {
            /// Mint a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }
    };
}

string_id!(
    /// Business tenant (a store). Every tool call is scoped to exactly one.
    TenantId
);
string_id!(
    /// Authenticated end user.
    UserId
);
string_id!(
    /// Agent configuration identifier.
    AgentId
);
string_id!(
    /// Groups every span produced while answering one user message.
    TraceId
);
string_id!(SpanId);
string_id!(ConversationId);

generated_id!(TraceId);
generated_id!(SpanId);
generated_id!(ConversationId);

/// The identity a bearer credential resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    /// Tenants this user may act on.
    pub tenants: Vec<TenantId>,
}

impl Principal {
    pub fn new(user_id: impl Into<UserId>, tenants: Vec<TenantId>) -> Self {
        Self {
            user_id: user_id.into(),
            tenants,
        }
    }

    pub fn can_access(&self, tenant: &TenantId) -> bool {
        self.tenants.iter().any(|t| t == tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = TraceId::generate();
        let b = TraceId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = TenantId::new("store-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"store-1\"");
        let back: TenantId = serde_json::from_str("\"store-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_principal_tenant_access() {
        let principal = Principal::new("u1", vec![TenantId::new("a"), TenantId::new("b")]);
        assert!(principal.can_access(&TenantId::new("a")));
        assert!(!principal.can_access(&TenantId::new("c")));
    }
}
