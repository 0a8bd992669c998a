//! Database access for vaidya-hub
//!
//! Schema creation lives in `vaidya_common::db`; this module holds the
//! hub-specific accessors.

pub mod settings;
