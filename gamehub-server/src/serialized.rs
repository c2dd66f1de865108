//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use chrono::{DateTime, NaiveDate, Utc};
use gamehub_tracker::{
    Analytics as TrackerAnalytics, CatalogGame as TrackerCatalogGame,
    CatalogPage as TrackerCatalogPage, CatalogTerm as TrackerCatalogTerm, Console, GameRequestData, TopGame as TrackerTopGame,
    VoteOutcome,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    id: Uuid,
    created_at: DateTime<Utc>,
    requester: String,
    game_title: String,
    game_image: Option<String>,
    catalog_id: Option<i64>,
    console: String,
    status: String,
    rejection_reason: Option<String>,
    available: bool,
    upvotes: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    success: bool,
    already_voted: bool,
    new_count: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatus {
    pub has_voted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    /// False when no admin password is set up
    pub configured: bool,
    pub authenticated: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnabledConsoles {
    consoles: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogGame {
    id: i64,
    name: String,
    released: Option<String>,
    background_image: Option<String>,
    rating: Option<f64>,
    metacritic: Option<i64>,
    platforms: Vec<String>,
    genres: Vec<String>,
    /// ESRB rating slug
    esrb_rating: Option<String>,
    /// The requestable consoles the game is released on
    consoles: Vec<String>,
    description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTerm {
    id: i64,
    name: String,
    slug: String,
    games_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    count: u64,
    has_next: bool,
    games: Vec<CatalogGame>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    total: usize,
    by_status: Vec<StatusCount>,
    by_console: Vec<ConsoleCount>,
    requests_over_time: Vec<DayCount>,
    top_games: Vec<TopGame>,
    available: usize,
    requests: Vec<GameRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCount {
    status: String,
    count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConsoleCount {
    console: String,
    count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DayCount {
    date: NaiveDate,
    count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopGame {
    title: String,
    upvotes: u64,
    count: usize,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<GameRequest> for GameRequestData {
    fn to_serialized(&self) -> GameRequest {
        GameRequest {
            id: self.id,
            created_at: self.created_at,
            requester: self.requester.clone(),
            game_title: self.game_title.clone(),
            game_image: self.game_image.clone(),
            catalog_id: self.catalog_id,
            console: self.console.to_string(),
            status: self.status.to_string(),
            rejection_reason: self.rejection_reason.clone(),
            available: self.available,
            upvotes: self.upvotes,
        }
    }
}

impl ToSerialized<VoteResult> for VoteOutcome {
    fn to_serialized(&self) -> VoteResult {
        VoteResult {
            success: self.success,
            already_voted: self.already_voted,
            new_count: self.new_count,
        }
    }
}

impl ToSerialized<EnabledConsoles> for Vec<Console> {
    fn to_serialized(&self) -> EnabledConsoles {
        EnabledConsoles {
            consoles: self.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ToSerialized<CatalogGame> for TrackerCatalogGame {
    fn to_serialized(&self) -> CatalogGame {
        CatalogGame {
            id: self.id,
            name: self.name.clone(),
            released: self.released.clone(),
            background_image: self.background_image.clone(),
            rating: self.rating,
            metacritic: self.metacritic,
            platforms: self.platforms.clone(),
            genres: self.genres.clone(),
            esrb_rating: self.esrb_rating.clone(),
            consoles: self.consoles().iter().map(|c| c.to_string()).collect(),
            description: self.description.clone(),
        }
    }
}

impl ToSerialized<CatalogTerm> for TrackerCatalogTerm {
    fn to_serialized(&self) -> CatalogTerm {
        CatalogTerm {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            games_count: self.games_count,
        }
    }
}

impl ToSerialized<CatalogPage> for TrackerCatalogPage {
    fn to_serialized(&self) -> CatalogPage {
        CatalogPage {
            count: self.count,
            has_next: self.has_next,
            games: self.games.to_serialized(),
        }
    }
}

impl ToSerialized<TopGame> for TrackerTopGame {
    fn to_serialized(&self) -> TopGame {
        TopGame {
            title: self.title.clone(),
            upvotes: self.upvotes,
            count: self.count,
        }
    }
}

impl ToSerialized<Analytics> for TrackerAnalytics {
    fn to_serialized(&self) -> Analytics {
        Analytics {
            total: self.total,
            by_status: self
                .by_status
                .iter()
                .map(|(status, count)| StatusCount {
                    status: status.to_string(),
                    count: *count,
                })
                .collect(),
            by_console: self
                .by_console
                .iter()
                .map(|(console, count)| ConsoleCount {
                    console: console.to_string(),
                    count: *count,
                })
                .collect(),
            requests_over_time: self
                .requests_over_time
                .iter()
                .map(|(date, count)| DayCount {
                    date: *date,
                    count: *count,
                })
                .collect(),
            top_games: self.top_games.to_serialized(),
            available: self.available,
            requests: self.requests.to_serialized(),
        }
    }
}
