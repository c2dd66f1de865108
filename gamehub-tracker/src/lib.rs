mod analytics;
mod auth;
mod catalog;
mod config;
mod consoles;
mod db;
mod ledger;
mod moderation;
mod requests;
mod util;
mod voter;

use std::sync::Arc;

pub use analytics::*;
pub use auth::*;
pub use catalog::*;
pub use config::*;
pub use consoles::*;
pub use db::*;
pub use ledger::*;
pub use moderation::*;
pub use requests::*;
pub use voter::*;

/// The game request tracker, tying votes, moderation, submissions and settings to one database.
pub struct Tracker {
    database: Arc<dyn Database>,
    catalog: Option<Arc<dyn Catalog>>,

    pub auth: AdminAuth,
    pub ledger: UpvoteLedger,
    pub moderation: ModerationWorkflow,
    pub requests: RequestDesk,
    pub consoles: ConsoleConfig,
}

impl Tracker {
    pub fn new(
        database: Arc<dyn Database>,
        catalog: Option<Arc<dyn Catalog>>,
        config: &Config,
    ) -> Self {
        let timeout = config.store_timeout;
        let catalog = catalog
            .map(|inner| Arc::new(TimedCatalog::new(inner, timeout)) as Arc<dyn Catalog>);

        Self {
            auth: AdminAuth::new(
                config.admin_password.clone(),
                config.admin_session_salt.clone(),
            ),
            ledger: UpvoteLedger::new(&database, timeout),
            moderation: ModerationWorkflow::new(&database, timeout),
            requests: RequestDesk::new(&database, catalog.as_ref(), timeout),
            consoles: ConsoleConfig::new(&database, timeout),
            database,
            catalog,
        }
    }

    /// The catalog, if one is configured
    pub fn catalog(&self) -> std::result::Result<&dyn Catalog, CatalogError> {
        self.catalog.as_deref().ok_or(CatalogError::NotConfigured)
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        &self.database
    }
}
