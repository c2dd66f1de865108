use std::sync::Arc;

use colored::Colorize;
use gamehub_server::ServerContext;
use gamehub_tracker::{
    Catalog, CatalogError, Config, ConfigError, Database, DatabaseError, PgDatabase, RawgCatalog,
    Tracker,
};
use log::{error, info, warn};
use thiserror::Error;
use tokio::runtime::{self, Runtime};

mod logging;

struct GameHub {
    config: Config,
    context: ServerContext,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum GameHubError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Could not set up the game catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Server stopped: {0}")]
    Server(#[from] std::io::Error),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl GameHub {
    fn new() -> Result<Self, GameHubError> {
        let config = Config::from_env()?;

        info!("Building async runtime...");
        let main_runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("gamehub-async")
            .build()
            .map_err(|e| GameHubError::Fatal(e.to_string()))?;

        info!("Connecting to database...");
        let database: Arc<dyn Database> = Arc::new(main_runtime.block_on(PgDatabase::new(
            &config.database_url,
            config.store_timeout,
        ))?);

        let catalog: Option<Arc<dyn Catalog>> = match &config.rawg_api_key {
            Some(key) => {
                let rawg = RawgCatalog::new(key.as_str(), config.store_timeout)?;
                Some(Arc::new(rawg) as Arc<dyn Catalog>)
            }
            None => {
                warn!("RAWG_API_KEY is not set, catalog search is disabled");
                None
            }
        };

        let tracker = Tracker::new(database, catalog, &config);

        if !tracker.auth.is_configured() {
            warn!("ADMIN_PASSWORD is not set, admin features are disabled");
        }

        Ok(Self {
            context: ServerContext::new(tracker, config.secure_cookies),
            config,
            runtime: main_runtime,
        })
    }

    fn run(self) -> Result<(), GameHubError> {
        let port = self.config.port;

        self.runtime
            .block_on(gamehub_server::run_server(self.context, port))?;

        Ok(())
    }
}

impl GameHubError {
    fn hint(&self) -> String {
        match self {
            GameHubError::Config(_) => "Check the environment variables. DATABASE_URL is required, numbers must be valid numbers.".to_string(),
            GameHubError::Database(_) => "This is a database error. Make sure PostgreSQL is running and DATABASE_URL points to it, then try again.".to_string(),
            GameHubError::Catalog(_) => "The HTTP client for RAWG could not be built. Unset RAWG_API_KEY to run without the catalog.".to_string(),
            GameHubError::Server(_) => "The server could not keep listening. Make sure the port is free.".to_string(),
            GameHubError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn report(error: GameHubError) {
    error!(
        "{} Read the error below to troubleshoot the issue.",
        "gamehub failed!".bold().red()
    );
    error!("{}", error);
    error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());
}

fn main() {
    logging::init_logger(logging::LogSettings::from_env());

    match GameHub::new() {
        Ok(gamehub) => {
            info!("Initialized successfully.");

            if let Err(error) = gamehub.run() {
                report(error);
            }
        }
        Err(error) => report(error),
    }
}
