use std::fmt::Write;

use hzsql_core::JdbcUrl;

use super::to_properties;

pub fn parse(url: &str, properties: Vec<(String, String)>, format: &str) -> anyhow::Result<()> {
    let info = to_properties(properties);
    let parsed = JdbcUrl::parse(url, info.as_ref())?;
    tracing::debug!(host = parsed.host(), schema = parsed.schema(), "parsed url");

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        _ => {
            print!("{}", format_identity(&parsed));
        }
    }

    Ok(())
}

pub fn accepts(url: &str) -> bool {
    let accepted = JdbcUrl::accepts(url);
    println!("{accepted}");
    accepted
}

pub(crate) fn format_identity(url: &JdbcUrl) -> String {
    let mut out = String::new();
    let port = url.port().map_or_else(|| "-".to_string(), |p| p.to_string());
    let _ = writeln!(out, "host:       {}", url.host());
    let _ = writeln!(out, "port:       {port}");
    let _ = writeln!(out, "schema:     {}", url.schema());
    if url.properties().is_empty() {
        let _ = writeln!(out, "properties: (none)");
    } else {
        let _ = writeln!(out, "properties:");
        for (key, value) in url.properties() {
            let _ = writeln!(out, "  {key} = {value}");
        }
    }
    let _ = writeln!(out, "canonical:  {}", url.canonical());
    out
}
