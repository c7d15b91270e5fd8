//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: identifier newtypes and the authenticated [`ids::Principal`]
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod ids;
