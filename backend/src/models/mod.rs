//! Domain models for LawnSync
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
