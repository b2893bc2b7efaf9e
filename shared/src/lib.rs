//! Shared types and models for LawnSync
//!
//! This crate contains the domain types, the task eligibility rules and the
//! email templates shared between the backend and the browser (via WASM).

pub mod email;
pub mod models;
pub mod scheduling;
pub mod types;
pub mod validation;

pub use models::*;
pub use scheduling::*;
pub use types::*;
pub use validation::*;
