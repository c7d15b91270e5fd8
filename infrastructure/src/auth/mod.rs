//! Credential resolvers

mod static_tokens;

pub use static_tokens::StaticTokenResolver;
