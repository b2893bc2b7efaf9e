//! Domain models for LawnSync

mod notification;
mod task;
mod user;
mod weather;

pub use notification::*;
pub use task::*;
pub use user::*;
pub use weather::*;
