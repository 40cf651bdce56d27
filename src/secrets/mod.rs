//! Secret resolution for credentials referenced by routes, consumers and gateways.
//!
//! The compiler never stores plaintext credentials in its inputs. Passwords and
//! client secrets are written as `$<key>` references and resolved through a
//! [`SecretsClient`] at the moment a feature needs them.
//!
//! # Backends
//!
//! - [`EnvVarSecretsClient`]: `ROUTEPLANE_SECRET_*` environment variables
//! - [`InMemorySecretsClient`]: fixed map, used for dry runs and tests
//! - [`CachedSecretsClient`]: TTL cache around any other backend

pub mod cached;
pub mod client;
pub mod env;
pub mod error;
pub mod memory;
pub mod reference;

pub use cached::CachedSecretsClient;
pub use client::SecretsClient;
pub use env::EnvVarSecretsClient;
pub use error::{Result, SecretsError};
pub use memory::InMemorySecretsClient;
pub use reference::{is_reference, reference_key, SecretResolver};
