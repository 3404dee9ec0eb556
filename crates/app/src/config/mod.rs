//! Configuration shared by the binary and anything embedding the services.

pub mod db;
pub mod logging;

pub use db::DatabaseConfig;
pub use logging::{LogFormat, LoggingConfig};
