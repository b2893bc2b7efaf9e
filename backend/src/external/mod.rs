//! External API integrations

pub mod email;
pub mod weather;

pub use email::{EmailClient, EmailReceipt};
pub use weather::WeatherClient;
