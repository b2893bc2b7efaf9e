//! HTTP request handlers

pub mod auth;
pub mod health;
pub mod lawn;
pub mod notification;
pub mod schedule;
pub mod task;
pub mod weather;

pub use auth::*;
pub use health::*;
pub use lawn::*;
pub use notification::*;
pub use schedule::*;
pub use task::*;
pub use weather::*;
