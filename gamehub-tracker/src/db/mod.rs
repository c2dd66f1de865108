use async_trait::async_trait;
use thiserror::Error;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// The database could not be reached, or did not answer in time
    #[error("Database is unavailable: {0}")]
    Unavailable(String),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                DatabaseError::NotFound { .. } => Ok(()),
                e => Err(e),
            },
        }
    }
}

impl DatabaseError {
    pub(crate) fn request_not_found() -> Self {
        Self::NotFound {
            resource: "game request",
            identifier: "id",
        }
    }
}

/// Represents a type that can persist game requests and their votes.
///
/// Vote operations must be atomic: the existence check and the counter change
/// happen in one unit, so concurrent calls for the same request and voter
/// can never count twice.
#[async_trait]
pub trait Database: Send + Sync {
    async fn request_by_id(&self, request_id: PrimaryKey) -> Result<GameRequestData>;
    /// Lists requests matching the filter, most upvoted first, then newest first
    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<GameRequestData>>;
    /// Inserts a pending request, failing with a conflict if the same game is already requested for the console
    async fn create_request(&self, new_request: NewRequest) -> Result<GameRequestData>;
    /// Applies the update to the stored request while holding it exclusively
    async fn update_request(&self, updated_request: UpdatedRequest) -> Result<GameRequestData>;
    /// Deletes a request along with its votes
    async fn delete_request(&self, request_id: PrimaryKey) -> Result<()>;

    async fn cast_vote(&self, request_id: PrimaryKey, voter_id: &str) -> Result<VoteOutcome>;
    async fn remove_vote(&self, request_id: PrimaryKey, voter_id: &str) -> Result<VoteOutcome>;
    async fn vote_exists(&self, request_id: PrimaryKey, voter_id: &str) -> Result<bool>;

    async fn config_value(&self, key: &str) -> Result<Option<serde_json::Value>>;
    async fn set_config_value(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub requester: String,
    pub game_title: String,
    pub game_image: Option<String>,
    pub catalog_id: Option<i64>,
    pub console: Console,
}

/// A partial update of a request's moderation fields.
/// How the fields interact is decided in [crate::moderation].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatedRequest {
    pub id: PrimaryKey,
    pub status: Option<RequestStatus>,
    /// `Some(None)` clears the reason
    pub rejection_reason: Option<Option<String>>,
    pub available: Option<bool>,
    /// Administrative correction of the vote counter
    pub upvotes: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub console: Option<Console>,
    pub catalog_id: Option<i64>,
}

impl RequestFilter {
    pub fn matches(&self, request: &GameRequestData) -> bool {
        self.status.map_or(true, |s| request.status == s)
            && self.console.map_or(true, |c| request.console == c)
            && self
                .catalog_id
                .map_or(true, |id| request.catalog_id == Some(id))
    }
}

/// Orders requests the way listings show them
pub fn sort_requests(requests: &mut [GameRequestData]) {
    requests.sort_by(|a, b| {
        b.upvotes
            .cmp(&a.upvotes)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

impl NewRequest {
    /// True if an existing request asks for the same game on the same console
    pub fn duplicates(&self, existing: &GameRequestData) -> bool {
        if existing.console != self.console {
            return false;
        }

        match (self.catalog_id, existing.catalog_id) {
            (Some(a), Some(b)) if a == b => true,
            _ => title_key(&existing.game_title) == title_key(&self.game_title),
        }
    }
}

/// Folds a title the way the unique index on `lower(btrim(game_title))` does
fn title_key(title: &str) -> String {
    title.trim_matches(' ').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_request(title: &str, console: Console, catalog_id: Option<i64>) -> NewRequest {
        NewRequest {
            requester: "Jane".to_string(),
            game_title: title.to_string(),
            game_image: None,
            catalog_id,
            console,
        }
    }

    #[tokio::test]
    async fn detects_duplicates_across_letter_case() {
        let db = MemoryDatabase::new();

        db.create_request(new_request("Pokémon Legends", Console::NintendoSwitch, None))
            .await
            .unwrap();

        let same = db
            .create_request(new_request("POKÉMON LEGENDS ", Console::NintendoSwitch, None))
            .await;
        assert!(matches!(same, Err(DatabaseError::Conflict { .. })));

        db.create_request(new_request("Pokémon Legends", Console::Ps5, None))
            .await
            .unwrap();
        db.create_request(new_request("Pokemon Legends", Console::NintendoSwitch, None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn detects_duplicates_by_catalog_id() {
        let db = MemoryDatabase::new();

        db.create_request(new_request("Elden Ring", Console::Ps5, Some(326243)))
            .await
            .unwrap();

        let renamed = db
            .create_request(new_request("ELDEN RING: Deluxe", Console::Ps5, Some(326243)))
            .await;
        assert!(matches!(renamed, Err(DatabaseError::Conflict { .. })));
    }
}
