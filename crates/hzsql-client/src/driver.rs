//! Driver entry point.
//!
//! The [`Driver`] claims `jdbc:hazelcast://` urls, owns the
//! [`ConnectionCache`] shared by every client it hands out, and builds
//! [`ClientConfig`](hzsql_core::ClientConfig)s through its [`ConfigFactory`].

use std::sync::Arc;

use hzsql_core::{ConfigFactory, DefaultConfigFactory, JdbcUrl, Properties};

use crate::cache::ConnectionCache;
use crate::client::SqlClient;
use crate::error::ClientError;
use crate::handle::ConnectionProvider;

pub struct Driver {
    cache: Arc<ConnectionCache>,
    configs: Arc<dyn ConfigFactory>,
}

impl Driver {
    pub const NAME: &'static str = "hzsql";

    /// Create a driver with an empty cache and the default config factory.
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            cache: Arc::new(ConnectionCache::new(provider)),
            configs: Arc::new(DefaultConfigFactory::default()),
        }
    }

    /// Builder method: replace the config factory.
    pub fn with_config_factory(self, configs: Arc<dyn ConfigFactory>) -> Self {
        Self { configs, ..self }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Whether this driver claims `url`.
    pub fn accepts_url(&self, url: &str) -> bool {
        JdbcUrl::accepts(url)
    }

    /// Open a client for `url`.
    ///
    /// Returns `Ok(None)` when `url` is not a `jdbc:hazelcast://` url, so the
    /// caller can try another driver.
    pub fn connect(
        &self,
        url: &str,
        info: Option<&Properties>,
    ) -> Result<Option<SqlClient>, ClientError> {
        let url = match JdbcUrl::parse(url, info) {
            Ok(url) => url,
            Err(e) if e.is_not_acceptable() => {
                tracing::trace!(url, "url not claimed by driver");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        SqlClient::connect(url, Arc::clone(&self.cache), self.configs.as_ref()).map(Some)
    }

    pub fn cache(&self) -> &Arc<ConnectionCache> {
        &self.cache
    }

    /// Shut down every connection opened through this driver.
    pub fn drain(&self) -> usize {
        self.cache.drain()
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("name", &Self::NAME)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{}", self.name(), self.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConnectError, ExecuteError};
    use crate::handle::{ConnectionHandle, SqlResult, SqlStatement};
    use hzsql_core::{ClientConfig, ConfigError};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct StaticHandle;

    impl ConnectionHandle for StaticHandle {
        fn is_alive(&self) -> bool {
            true
        }

        fn execute(&self, _statement: &SqlStatement) -> Result<SqlResult, ExecuteError> {
            Ok(SqlResult::UpdateCount(0))
        }

        fn shutdown(&self) {}
    }

    /// Records the configs it is asked to connect with.
    #[derive(Default)]
    struct ConfigRecorder {
        seen: Mutex<Vec<ClientConfig>>,
    }

    impl ConnectionProvider for ConfigRecorder {
        fn connect(
            &self,
            config: &ClientConfig,
        ) -> Result<Arc<dyn ConnectionHandle>, ConnectError> {
            self.seen.lock().unwrap().push(config.clone());
            Ok(Arc::new(StaticHandle))
        }
    }

    struct FixedClusterName(&'static str);

    impl ConfigFactory for FixedClusterName {
        fn client_config(&self, url: &JdbcUrl) -> Result<ClientConfig, ConfigError> {
            Ok(ClientConfig {
                cluster_name: self.0.to_string(),
                cluster_members: vec![url.authority()],
                ..ClientConfig::default()
            })
        }
    }

    fn driver() -> (Driver, Arc<ConfigRecorder>) {
        let provider = Arc::new(ConfigRecorder::default());
        (Driver::new(provider.clone()), provider)
    }

    #[test]
    fn driver_metadata() {
        let (driver, _) = driver();
        assert_eq!(driver.name(), "hzsql");
        assert!(!driver.version().is_empty());
        assert!(driver.to_string().starts_with("hzsql v"));
    }

    #[test]
    fn accepts_url_follows_grammar() {
        let (driver, _) = driver();
        assert!(driver.accepts_url("jdbc:hazelcast://localhost:5701/public"));
        assert!(!driver.accepts_url("jdbc:postgresql://localhost/db"));
        assert!(!driver.accepts_url("jdbc:hazelcast://localhost"));
    }

    #[test]
    fn connect_foreign_url_returns_none() {
        let (driver, provider) = driver();
        assert!(driver.connect("postgres://host/db", None).unwrap().is_none());
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn connect_missing_schema_is_error() {
        let (driver, _) = driver();
        let err = driver.connect("jdbc:hazelcast://localhost:5701", None).unwrap_err();
        assert!(matches!(err, ClientError::Url(_)));
    }

    #[test]
    fn connect_passes_info_into_config() {
        let (driver, provider) = driver();
        let info = Properties::from([("clusterName".to_string(), "prod".to_string())]);
        let client = driver
            .connect("jdbc:hazelcast://10.0.0.7:5701/public", Some(&info))
            .unwrap()
            .unwrap();
        assert_eq!(client.url().property("clusterName"), Some("prod"));

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].cluster_name, "prod");
        assert_eq!(seen[0].cluster_members, vec!["10.0.0.7:5701".to_string()]);
    }

    #[test]
    fn custom_config_factory_is_used() {
        let (driver, provider) = driver();
        let driver = driver.with_config_factory(Arc::new(FixedClusterName("fixed")));
        driver.connect("jdbc:hazelcast://h/s", None).unwrap().unwrap();
        assert_eq!(provider.seen.lock().unwrap()[0].cluster_name, "fixed");
    }

    #[test]
    fn drain_empties_cache() {
        let (driver, _) = driver();
        driver.connect("jdbc:hazelcast://a/s", None).unwrap();
        driver.connect("jdbc:hazelcast://b/s", None).unwrap();
        assert_eq!(driver.cache().len(), 2);
        assert_eq!(driver.drain(), 2);
        assert!(driver.cache().is_empty());
    }
}
