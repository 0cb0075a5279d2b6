//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! wallet.toml (optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → sections handed to each service constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults; an empty file targets devnet
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, resolve_config_with, ConfigError};
pub use schema::{
    AirdropConfig, ClientConfig, Cluster, ExplorerConfig, IdentityConfig, NetworkConfig,
    ObservabilityConfig,
};
