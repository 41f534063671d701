//! apimock: an OpenAPI mock server.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                      APIMOCK                          │
//!  Client Request     │  ┌────────┐   ┌────────────┐   ┌──────────────┐      │
//!  ───────────────────┼─▶│  http  │──▶│  dispatch  │──▶│ proxy rules  │──────┼──▶ proxy_url
//!                     │  │ server │   │            │   └──────────────┘      │
//!                     │  └────────┘   │            │   ┌──────────────┐      │
//!                     │               │            │──▶│ route tree   │      │
//!                     │               │            │   └──────┬───────┘      │
//!                     │               │            │          ▼              │
//!                     │               │            │   ┌──────────────┐      │
//!                     │               │            │──▶│  context     │      │
//!                     │               │            │   └──────────────┘      │
//!                     │               │            │   ┌──────────────┐      │
//!  Client Response    │  ┌────────┐   │            │──▶│ handler +    │      │
//!  ◀──────────────────┼──│response│◀──│            │   │ response     │      │
//!                     │  └────────┘   └────────────┘   │ builder      │      │
//!                     │                                └──────────────┘      │
//!                     │  ┌──────────────────────────────────────────────┐    │
//!                     │  │ modules: routes/ files, watcher, registry    │    │
//!                     │  │ console: proxy / context / routes commands   │    │
//!                     │  │ config · observability · lifecycle           │    │
//!                     │  └──────────────────────────────────────────────┘    │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use apimock::config::{load_config, MockConfig};
use apimock::lifecycle;
use apimock::observability::logging;

#[derive(Parser)]
#[command(name = "apimock")]
#[command(about = "Serve an OpenAPI description as a mock server", long_about = None)]
struct Cli {
    /// OpenAPI document (JSON or YAML)
    openapi_path: Option<PathBuf>,

    /// Directory containing routes/
    base_path: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind, without the port
    #[arg(long)]
    bind: Option<String>,

    /// Backend to forward proxied paths to
    #[arg(long)]
    proxy_url: Option<String>,

    /// Path prefix stripped before routing
    #[arg(long)]
    prefix: Option<String>,

    /// Start the HTTP server
    #[arg(long, overrides_with = "no_serve")]
    serve: bool,

    /// Do not start the HTTP server
    #[arg(long)]
    no_serve: bool,

    /// Start the interactive console
    #[arg(long)]
    repl: bool,

    /// Reload route files when they change
    #[arg(short, long)]
    watch: bool,

    /// Seed for reproducible random responses
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    /// Overlay command-line flags on a loaded config.
    fn apply(self, mut config: MockConfig) -> MockConfig {
        if let Some(path) = self.openapi_path {
            config.openapi_path = Some(path);
        }
        if let Some(path) = self.base_path {
            config.base_path = path;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(url) = self.proxy_url {
            config.proxy_url = Some(url);
        }
        if let Some(prefix) = self.prefix {
            config.route_prefix = prefix;
        }
        if self.serve {
            config.start_server = true;
        }
        if self.no_serve {
            config.start_server = false;
        }
        if self.repl {
            config.start_repl = true;
        }
        if self.watch {
            config.watch.routes = true;
        }
        if let Some(seed) = self.seed {
            config.generation.seed = Some(seed);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MockConfig::default(),
    };
    let config = cli.apply(config);

    logging::init(&config.observability.log_level);
    tracing::info!("apimock v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        address = %config.listen_address(),
        openapi = ?config.openapi_path,
        base_path = ?config.base_path,
        proxy_url = ?config.proxy_url,
        "Configuration loaded"
    );

    lifecycle::run(config).await?;
    Ok(())
}
