mod app_config;

pub use app_config::{AppConfig, AppSettings, CorsConfig, DatabaseConfig, ServerConfig};
