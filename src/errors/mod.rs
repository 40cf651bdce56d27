//! # Error Handling
//!
//! Error types shared by the compiler, the admin client and the CLI.

pub mod types;

pub use types::{ContextKind, Result, RouteplaneError};

/// Short alias used throughout the crate
pub type Error = RouteplaneError;
