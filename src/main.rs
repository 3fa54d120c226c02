//! Command-line interface for wfs-capabilities

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
use wfs_capabilities::{Client, ClientOptions};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "wfs-capabilities")]
#[command(author, version, about = "Fetch and decode WFS capabilities", long_about = None)]
struct Cli {
    /// Service endpoint URL
    #[arg(value_name = "URL")]
    url: String,

    /// Pin the protocol version instead of negotiating
    #[arg(long, value_name = "VERSION")]
    wfs_version: Option<String>,

    /// User-Agent header
    #[arg(long)]
    user_agent: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Extra query parameter appended to every request (repeatable)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Print only the feature types
    #[arg(long)]
    feature_types: bool,

    /// Pretty print the output
    #[arg(long)]
    pretty: bool,
}

#[cfg(feature = "cli")]
fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

#[cfg(feature = "cli")]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = ClientOptions::new();
    options.version = cli.wfs_version;
    options.user_agent = cli.user_agent;
    options.timeout = cli.timeout;
    for (key, value) in cli.params {
        options = options.with_query_param(key, value);
    }

    let client = Client::new(&cli.url, options)?;

    let json = if cli.feature_types {
        serde_json::to_value(client.feature_types().await?)?
    } else {
        serde_json::to_value(client.capabilities().await?)?
    };

    let output = if cli.pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    println!("{}", output);
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
