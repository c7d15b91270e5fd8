//! Prompt domain
//!
//! Templates for generating the system prompt of a chat run.

pub mod chat;

pub use chat::ChatPromptTemplate;
