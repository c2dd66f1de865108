use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::Console;

mod rawg;
mod timed;
pub use rawg::*;
pub use timed::*;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog is not configured, set RAWG_API_KEY")]
    NotConfigured,

    #[error("Game was not found in the catalog")]
    NotFound,

    #[error("Failed to fetch from catalog: {0}")]
    FetchError(String),

    #[error("Failed to parse catalog response: {0}")]
    ParseError(String),

    #[error("Catalog did not answer within {0:?}")]
    TimedOut(Duration),
}

/// A game as described by the external catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogGame {
    pub id: i64,
    pub name: String,
    pub released: Option<String>,
    pub background_image: Option<String>,
    pub rating: Option<f64>,
    pub metacritic: Option<i64>,
    /// Platform names as the catalog reports them
    pub platforms: Vec<String>,
    /// Genre names
    pub genres: Vec<String>,
    pub genre_slugs: Vec<String>,
    /// ESRB rating slug, like `teen` or `mature`
    pub esrb_rating: Option<String>,
    /// Plain text description, only present on detail lookups
    pub description: Option<String>,
}

/// A genre or tag games can be browsed by
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTerm {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub games_count: u64,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    /// Total number of matches in the catalog
    pub count: u64,
    pub has_next: bool,
    pub games: Vec<CatalogGame>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub platforms: Vec<Console>,
    /// Genre slugs. With more than one, games matching any of them are kept.
    pub genres: Vec<String>,
    /// Tag ids or slugs, all of which must match
    pub tags: Vec<String>,
    pub ordering: Option<CatalogOrdering>,
    /// Release date window, takes precedence over `released_only`
    pub dates: Option<DateRange>,
    /// Leave out games without a past release date
    pub released_only: bool,
    /// Leave out games rated mature or adults only
    pub hide_mature: bool,
}

/// An inclusive range of release dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Sort orders the catalog supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrdering {
    Newest,
    Rating,
    Popularity,
    Metacritic,
    Name,
}

/// A read-only source of game metadata
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn game(&self, id: i64) -> Result<CatalogGame, CatalogError>;
    async fn search(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError>;
    /// DLCs, season passes and expansions of a game. These are shown, never requested.
    async fn additions(&self, id: i64) -> Result<Vec<CatalogGame>, CatalogError>;
    async fn genres(&self) -> Result<Vec<CatalogTerm>, CatalogError>;
    async fn tags(&self) -> Result<Vec<CatalogTerm>, CatalogError>;
}

lazy_static! {
    static ref ADDITION_PATTERNS: [Regex; 5] = [
        Regex::new(r"(?i)season pass").unwrap(),
        Regex::new(r"(?i)\bdlc\b").unwrap(),
        Regex::new(r"(?i)add-?on").unwrap(),
        Regex::new(r"(?i)expansion pack").unwrap(),
        Regex::new(r"(?i)\bexpansion\s*:\s*").unwrap(),
    ];
}

/// ESRB slugs treated as mature content
const MATURE_RATINGS: [&str; 4] = ["adults-only", "mature", "ao", "m"];

impl CatalogGame {
    /// The requestable consoles this game is released on
    pub fn consoles(&self) -> Vec<Console> {
        let mut consoles: Vec<_> = self
            .platforms
            .iter()
            .filter_map(|p| Console::from_platform_name(p))
            .collect();

        consoles.sort();
        consoles.dedup();
        consoles
    }

    /// True if this looks like a DLC, season pass or other add-on rather than a game
    pub fn is_addition(&self) -> bool {
        ADDITION_PATTERNS.iter().any(|p| p.is_match(&self.name))
    }

    pub fn is_mature(&self) -> bool {
        let Some(rating) = self.esrb_rating.as_deref().map(str::to_lowercase) else {
            return false;
        };

        MATURE_RATINGS.iter().any(|m| rating.contains(m))
    }

    /// True if the game has any of the genre slugs, or none are asked for
    pub fn matches_any_genre(&self, slugs: &[String]) -> bool {
        slugs.is_empty() || slugs.iter().any(|s| self.genre_slugs.contains(s))
    }
}

impl CatalogQuery {
    pub const MAX_PAGE_SIZE: u32 = 40;
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_MULTI_GENRE_FETCH: u32 = 60;

    /// Narrows the requested platforms to the enabled ones.
    /// Without a usable request, every enabled platform is searched.
    pub fn restrict_platforms(&mut self, enabled: &[Console]) {
        self.platforms.retain(|c| enabled.contains(c));

        if self.platforms.is_empty() {
            self.platforms = enabled.to_vec();
        }
    }

    /// Genres are matched locally when more than one is asked for
    pub fn filters_genres_locally(&self) -> bool {
        self.genres.len() > 1
    }

    /// How many games to ask for, leaving room for the ones filtered out locally
    pub fn fetch_size(&self) -> u32 {
        let page_size = self.page_size.clamp(1, Self::MAX_PAGE_SIZE);

        if self.filters_genres_locally() {
            (page_size * 4).min(Self::MAX_MULTI_GENRE_FETCH)
        } else {
            (page_size * 2).min(Self::MAX_PAGE_SIZE)
        }
    }

    /// The release window to ask for, if any
    pub fn release_window(&self, today: NaiveDate) -> Option<DateRange> {
        self.dates.or_else(|| {
            self.released_only.then(|| DateRange {
                from: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN),
                to: today,
            })
        })
    }

    /// Whether a fetched game belongs in the results
    pub fn keeps(&self, game: &CatalogGame) -> bool {
        if game.is_addition() || (self.hide_mature && game.is_mature()) {
            return false;
        }

        !self.filters_genres_locally() || game.matches_any_genre(&self.genres)
    }
}

impl DateRange {
    /// Parses `YYYY-MM-DD,YYYY-MM-DD`
    pub fn from_param(param: &str) -> Option<Self> {
        let (from, to) = param.split_once(',')?;

        let range = Self {
            from: NaiveDate::parse_from_str(from.trim(), "%Y-%m-%d").ok()?,
            to: NaiveDate::parse_from_str(to.trim(), "%Y-%m-%d").ok()?,
        };

        (range.from <= range.to).then_some(range)
    }

    pub fn as_param(&self) -> String {
        format!("{},{}", self.from.format("%Y-%m-%d"), self.to.format("%Y-%m-%d"))
    }
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
            platforms: vec![],
            genres: vec![],
            tags: vec![],
            ordering: None,
            dates: None,
            released_only: false,
            hide_mature: false,
        }
    }
}

impl CatalogOrdering {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Newest => "-released",
            Self::Rating => "-rating",
            Self::Popularity => "-added",
            Self::Metacritic => "-metacritic",
            Self::Name => "name",
        }
    }

    pub fn from_param(param: &str) -> Option<Self> {
        let ordering = match param {
            "-released" => Self::Newest,
            "-rating" => Self::Rating,
            "-added" => Self::Popularity,
            "-metacritic" => Self::Metacritic,
            "name" => Self::Name,
            _ => return None,
        };

        Some(ordering)
    }
}
