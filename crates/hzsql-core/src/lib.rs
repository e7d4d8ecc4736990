pub mod config;
pub mod url;

pub use config::{ClientConfig, ConfigError, ConfigFactory, DefaultConfigFactory};
pub use url::{JdbcUrl, Properties, UrlError};
