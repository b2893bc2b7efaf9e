//! Business logic services for LawnSync

pub mod auth;
pub mod lawn;
pub mod notification;
pub mod schedule;
pub mod task;
pub mod weather;

pub use auth::AuthService;
pub use lawn::LawnService;
pub use notification::NotificationService;
pub use schedule::ScheduleService;
pub use task::TaskService;
pub use weather::WeatherService;
