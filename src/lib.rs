//! Finance tracker client
//!
//! Client-side state and synchronization for a personal finance tracker:
//! monthly balances, server-computed metrics, and an assistant chat, all
//! backed by a remote HTTP API.
//!
//! # Architecture
//!
//! - **Reactive cells**: [`reactive::Signal`] with synchronous effects
//! - **Resource clients**: one per API resource, failures normalized to [`error::DomainError`]
//! - **State stores**: one per screen, commands that call a client and fold the outcome into cells
//! - **Theme**: process-scoped preference with persisted storage
//!
//! # Modules
//!
//! - [`api`]: HTTP resource clients and the service traits stores depend on
//! - [`error`]: domain, validation and setup errors; the per-resource normalizer
//! - [`models`]: wire types
//! - [`reactive`]: observable cells
//! - [`stores`]: per-screen state stores
//! - [`theme`]: theme preference store

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod reactive;
pub mod stores;
pub mod telemetry;
pub mod theme;

pub use error::{DomainError, Result};
