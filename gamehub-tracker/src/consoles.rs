use std::{sync::Arc, time::Duration};

use log::warn;
use serde_json::Value;

use crate::{util::with_timeout, AdminSession, Console, Database, DatabaseError};

const ENABLED_CONSOLES_KEY: &str = "enabled_consoles";

/// The consoles admins chose to show in catalog filters
pub struct ConsoleConfig {
    db: Arc<dyn Database>,
    timeout: Duration,
}

impl ConsoleConfig {
    pub fn new(db: &Arc<dyn Database>, timeout: Duration) -> Self {
        Self {
            db: db.clone(),
            timeout,
        }
    }

    /// Returns the enabled consoles, falling back to the defaults
    /// when nothing usable is stored or the database can't be read
    pub async fn enabled(&self) -> Vec<Console> {
        let stored = with_timeout(self.timeout, self.db.config_value(ENABLED_CONSOLES_KEY)).await;

        match stored {
            Ok(Some(value)) => {
                let consoles = parse_consoles(&value);

                if consoles.is_empty() {
                    Console::DEFAULT_ENABLED.to_vec()
                } else {
                    consoles
                }
            }
            Ok(None) => Console::DEFAULT_ENABLED.to_vec(),
            Err(e) => {
                warn!("Could not read enabled consoles, using defaults: {}", e);
                Console::DEFAULT_ENABLED.to_vec()
            }
        }
    }

    /// Stores the known consoles out of the given names, returning what was stored
    pub async fn set_enabled(
        &self,
        _session: &AdminSession,
        names: &Value,
    ) -> Result<Vec<Console>, DatabaseError> {
        let consoles = parse_consoles(names);
        let value = Value::Array(
            consoles
                .iter()
                .map(|c| Value::String(c.as_str().to_string()))
                .collect(),
        );

        with_timeout(
            self.timeout,
            self.db.set_config_value(ENABLED_CONSOLES_KEY, value),
        )
        .await?;

        Ok(consoles)
    }
}

/// Reads a list of console names, skipping anything unknown or repeated
fn parse_consoles(value: &Value) -> Vec<Console> {
    let Some(names) = value.as_array() else {
        return vec![];
    };

    let mut consoles = Vec::new();

    for console in names.iter().filter_map(|n| n.as_str()?.parse::<Console>().ok()) {
        if !consoles.contains(&console) {
            consoles.push(console);
        }
    }

    consoles
}
