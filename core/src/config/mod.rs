//! Layered configuration for the reminder engines.
//!
//! 1. Defaults (from code)
//! 2. Config file (`nudge.toml`, or the path passed to the loader)
//! 3. Environment variables (`NUDGE_*`, `__` between nested keys)
//!
//! ```no_run
//! use nudge_core::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().with_file("./nudge.toml").load()?;
//! # Ok::<(), nudge_core::config::ConfigError>(())
//! ```

pub mod error;
pub mod loader;

pub use error::ConfigError;
pub use error::Result;
pub use loader::ConfigLoader;
pub use loader::DomainSettings;
pub use loader::DomainsConfig;
pub use loader::EngineConfig;
pub use loader::NudgeConfig;
pub use loader::ServerConfig;
pub use loader::SessionConfig;
pub use loader::StorageConfig;
