//! Chat run output events

pub mod event;

pub use event::ChatEvent;
