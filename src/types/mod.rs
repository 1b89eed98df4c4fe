//! Core types for the chat service.

pub mod generation;
pub mod message;

pub use generation::*;
pub use message::*;
