use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "hzsql",
    about = "hzsql — inspect jdbc:hazelcast endpoint urls",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a url and print its endpoint identity
    Parse {
        /// jdbc:hazelcast://host[:port]/schema[?k=v&...]
        url: String,
        /// Connection property (repeatable); url parameters win on conflict
        #[arg(short = 'p', long = "property", value_parser = commands::parse_key_val)]
        properties: Vec<(String, String)>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Check whether the driver claims a url.
    ///
    /// Prints `true` or `false`; exits non-zero for `false`.
    Accepts {
        url: String,
    },
    /// Print the client config a url resolves to, as TOML
    Config {
        url: String,
        #[arg(short = 'p', long = "property", value_parser = commands::parse_key_val)]
        properties: Vec<(String, String)>,
        /// Base config file; url data is layered on top
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hzsql=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { url, properties, format } => {
            commands::url::parse(&url, properties, &format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Accepts { url } => {
            if commands::url::accepts(&url) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Config { url, properties, config } => {
            commands::config::show(&url, properties, config.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
