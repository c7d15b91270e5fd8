//! Application-level configuration.
//!
//! - [`ChatParams`]: conversation loop control (registry TTL, dispatch mode, buffers)

pub mod chat_params;

pub use chat_params::{ChatParams, DispatchMode};
