//! ipwarm Common - Shared types and utilities
//!
//! This crate provides the error type, configuration, clock abstraction
//! and mail value types shared across all ipwarm components.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
