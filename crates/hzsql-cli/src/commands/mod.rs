pub mod config;
pub mod url;

use hzsql_core::Properties;

/// clap value parser for `key=value` pairs.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got `{s}`")),
    }
}

pub(crate) fn to_properties(pairs: Vec<(String, String)>) -> Option<Properties> {
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.into_iter().collect())
    }
}
