//! In-memory core of a customer-support chat backend.
//!
//! - [`tools::ToolRegistry`]: named tools with enable/disable and cached listings
//! - [`session::SessionStore`]: conversations with capped history and a per-user index
//! - [`session::ExpirySweeper`]: background eviction of idle sessions
//! - [`chat::ChatOrchestrator`]: one chat turn against a language-model client

pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod tools;

pub use error::{Result, SmartCustomError};
