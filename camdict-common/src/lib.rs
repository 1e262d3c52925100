//! Shared plumbing for the camdict workspace.
//!
//! Kept deliberately small so every crate can depend on it: today it only
//! carries the [`observability`] setup used by the `camdict` binary and by
//! integration tests that want log output.
//!
//! ```rust
//! use camdict_common::observability::{LogConfig, LogFormat};
//!
//! let cfg = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! assert_eq!(cfg.app_name, "camdict");
//! ```
pub mod observability;

pub use observability::{init_logging, LogConfig, LogFormat};
