//! Shared Strategy Framework
//!
//! Common utilities and traits for strategy services: lifecycle trait,
//! metrics collection, config-file loading, logging setup, and test helpers.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod testing;
pub mod traits;

pub use config::*;
pub use logging::*;
pub use metrics::*;
pub use testing::*;
pub use traits::*;
