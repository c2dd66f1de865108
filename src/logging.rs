use std::fmt::{self, Display};

use colored::Colorize;
use log::{Level, LevelFilter};

/// Crates whose records are shown at the configured level.
/// Everything else only gets through with warnings and errors.
const LOCAL_CRATES: [&str; 3] = ["gamehub", "gamehub_server", "gamehub_tracker"];
const LOG_LEVEL_VAR: &str = "GAMEHUB_LOG";

/// How much the gamehub crates log, read from `GAMEHUB_LOG`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogSettings {
    pub local: LevelFilter,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_LEVEL_VAR).ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        let local = value
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(LevelFilter::Info);

        Self { local }
    }
}

pub fn init_logger(settings: LogSettings) {
    let dispatch = LOCAL_CRATES.iter().fold(
        fern::Dispatch::new().level(LevelFilter::Warn),
        |dispatch, name| dispatch.level_for(*name, settings.local),
    );

    let result = dispatch
        .format(|out, message, record| {
            out.finish(format_args!(
                "{:^5} {} {:^8} {}",
                Badge(record.level()),
                chrono::Local::now().format("%H:%M:%S").to_string().bright_black(),
                Target::from_str(record.target()),
                message
            ))
        })
        .chain(std::io::stdout())
        .apply();

    if let Err(e) = result {
        eprintln!("Logging could not be initialized: {}", e);
    }
}

#[derive(Debug, PartialEq)]
enum Target {
    External(String),
    GameHub,
    Server,
    Tracker,
}

impl Target {
    fn from_str(target: &str) -> Self {
        match target.split("::").next().unwrap_or_default() {
            "gamehub" => Self::GameHub,
            "gamehub_server" => Self::Server,
            "gamehub_tracker" => Self::Tracker,
            other => Self::External(other.to_string()),
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::External(name) => name.as_str().clear(),
            Self::GameHub => "GAMEHUB".bright_cyan(),
            Self::Server => "SERVER".bright_green(),
            Self::Tracker => "TRACKER".bright_purple(),
        };

        Display::fmt(&label, f)
    }
}

/// Colored level marker in front of each line
struct Badge(Level);

impl Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let badge = match self.0 {
            Level::Error => " ERR ".black().on_red().bold(),
            Level::Warn => " WRN ".black().on_yellow().bold(),
            Level::Info => " INF ".black().on_blue().bold(),
            Level::Debug => " DBG ".white().on_black(),
            Level::Trace => " TRC ".normal(),
        };

        Display::fmt(&badge, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_targets_by_crate() {
        assert_eq!(Target::from_str("gamehub_tracker::ledger"), Target::Tracker);
        assert_eq!(Target::from_str("gamehub_server"), Target::Server);
        assert_eq!(Target::from_str("gamehub"), Target::GameHub);
        assert_eq!(
            Target::from_str("sqlx::query"),
            Target::External("sqlx".to_string())
        );
    }

    #[test]
    fn reads_the_local_level() {
        assert_eq!(LogSettings::parse(None).local, LevelFilter::Info);
        assert_eq!(LogSettings::parse(Some("debug")).local, LevelFilter::Debug);
        assert_eq!(LogSettings::parse(Some(" WARN ")).local, LevelFilter::Warn);
        assert_eq!(LogSettings::parse(Some("chatty")).local, LevelFilter::Info);
    }
}
