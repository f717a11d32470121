pub mod app_config;
pub mod helpers;

pub use app_config::{AppConfig, Settings};
pub use helpers::*;
