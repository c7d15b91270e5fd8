//! Agent domain module
//!
//! An agent is a configured persona: base prompt, model parameters, turn
//! budget, the subset of tools it may call and its capability flags.

pub mod config;

pub use config::{AgentConfig, Capabilities, Verbosity};
