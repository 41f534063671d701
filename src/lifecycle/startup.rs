//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration and load the API description
//! - Build the dispatcher and load route files
//! - Start optional background pieces (watcher, metrics, console)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: config, API and bind errors abort startup
//! - Broken route files do not: they are logged and skipped
//! - The listener starts last, once routes are loaded

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::api::document::{ApiDescription, ApiLoadError};
use crate::config::{validate_config, ConfigError, MockConfig};
use crate::console::{repl, Console};
use crate::dispatch::Dispatcher;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::modules::loader::{LoadReport, RouteLoader};
use crate::modules::watcher::RouteWatcher;
use crate::observability::metrics;
use crate::proxy::forward::ForwardError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load API description: {0}")]
    Api(#[from] ApiLoadError),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error("failed to watch routes: {0}")]
    Watch(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The assembled server state, before any listener or console is started.
#[derive(Debug)]
pub struct MockServer {
    dispatcher: Arc<Dispatcher>,
    loader: RouteLoader,
}

impl MockServer {
    /// Validate `config`, load the API description and every route file.
    pub fn build(config: &MockConfig) -> Result<(Self, LoadReport), StartupError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let api = match &config.openapi_path {
            Some(path) => load_api(&config.base_path, path)?,
            None => ApiDescription::empty(),
        };
        tracing::info!(operations = api.operations().len(), "API description loaded");

        let dispatcher = Arc::new(Dispatcher::new(Arc::new(api), config)?);
        let loader = RouteLoader::new(
            config.routes_dir(),
            dispatcher.registry().clone(),
            dispatcher.contexts().clone(),
        );
        let report = loader.load_all();

        Ok((Self { dispatcher, loader }, report))
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn loader(&self) -> &RouteLoader {
        &self.loader
    }

    pub fn console(&self) -> Console {
        Console::new(
            self.dispatcher.proxy().clone(),
            self.dispatcher.contexts().clone(),
            self.dispatcher.registry().clone(),
        )
    }
}

/// An absolute OpenAPI path is used as is; a relative one is tried as given
/// and then under `base_path`.
fn load_api(base_path: &Path, openapi_path: &Path) -> Result<ApiDescription, ApiLoadError> {
    if openapi_path.is_relative() && !openapi_path.exists() {
        let under_base = base_path.join(openapi_path);
        if under_base.exists() {
            return ApiDescription::load(&under_base);
        }
    }
    ApiDescription::load(openapi_path)
}

/// Run the mock server until shutdown.
pub async fn run(config: MockConfig) -> Result<(), StartupError> {
    let (server, _report) = MockServer::build(&config)?;

    if config.generate.routes || config.generate.types {
        tracing::warn!("Code generation is not supported; serving existing route files only");
    }
    if config.watch.types {
        tracing::warn!("watch.types has no effect without code generation");
    }

    let _watcher = if config.watch.routes {
        Some(RouteWatcher::new(server.loader().clone()).run()?)
    } else {
        None
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let console = if config.start_repl {
        let task = tokio::spawn(repl::run(server.console(), shutdown.clone()));
        Some(task)
    } else {
        None
    };

    if config.start_server {
        let listener = TcpListener::bind(config.listen_address()).await?;
        tracing::info!(
            address = %listener.local_addr()?,
            routes_dir = ?config.routes_dir(),
            "Mock server listening"
        );
        HttpServer::new(server.dispatcher().clone(), &config)
            .run(listener, shutdown.signal())
            .await?;
    } else if console.is_some() {
        shutdown.signal().await;
    }

    if let Some(task) = console {
        task.abort();
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
