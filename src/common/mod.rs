//! Common types shared across ilium.
//!
//! - Configuration constants and [`DeviceConfig`]
//! - Error types

pub mod config;
pub mod error;

pub use config::DeviceConfig;
pub use error::{Error, Result};
