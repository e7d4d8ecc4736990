use std::path::Path;

use hzsql_core::{ClientConfig, ConfigFactory, DefaultConfigFactory, JdbcUrl};

use super::to_properties;

pub fn show(
    url: &str,
    properties: Vec<(String, String)>,
    base: Option<&str>,
) -> anyhow::Result<()> {
    println!("{}", resolve(url, properties, base)?);
    Ok(())
}

pub(crate) fn resolve(
    url: &str,
    properties: Vec<(String, String)>,
    base: Option<&str>,
) -> anyhow::Result<String> {
    let base = match base {
        Some(path) => {
            tracing::info!(path, "loading base config");
            ClientConfig::from_file(Path::new(path))?
        }
        None => ClientConfig::default(),
    };
    let info = to_properties(properties);
    let parsed = JdbcUrl::parse(url, info.as_ref())?;
    let config = DefaultConfigFactory::new(base).client_config(&parsed)?;
    Ok(config.to_toml_string()?)
}
