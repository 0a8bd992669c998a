//! # Vaidya Common Library
//!
//! Shared code for the PharmaVaidya services including:
//! - Domain models (remedies, progress, catalog plants)
//! - Event types (VaidyaEvent enum) and the EventBus
//! - Configuration loading and root folder resolution
//! - Database bootstrap

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
