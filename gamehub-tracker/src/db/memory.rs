use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    Database, DatabaseError, GameRequestData, NewRequest, PrimaryKey, RequestFilter,
    RequestStatus, Result, UpdatedRequest, VoteOutcome,
};

/// An in-process database, used for development and tests.
///
/// Every operation runs under a single lock, which gives it the same
/// atomicity the postgres implementation gets from transactions.
#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<MemoryState>,
    latency: Mutex<Option<Duration>>,
    unavailable: Mutex<bool>,
}

#[derive(Default)]
struct MemoryState {
    requests: HashMap<PrimaryKey, GameRequestData>,
    votes: HashSet<(PrimaryKey, String)>,
    config: HashMap<String, serde_json::Value>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every operation before it touches any state
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Makes every operation fail as if the database could not be reached
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    /// Returns the number of recorded votes for a request
    pub fn vote_count(&self, request_id: PrimaryKey) -> usize {
        self.state
            .lock()
            .votes
            .iter()
            .filter(|(id, _)| *id == request_id)
            .count()
    }

    async fn round_trip(&self) -> Result<()> {
        let latency = *self.latency.lock();

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if *self.unavailable.lock() {
            return Err(DatabaseError::Unavailable(
                "memory database is switched off".to_string(),
            ));
        }

        Ok(())
    }
}

impl MemoryState {
    fn request(&self, request_id: PrimaryKey) -> Result<&GameRequestData> {
        self.requests
            .get(&request_id)
            .ok_or_else(DatabaseError::request_not_found)
    }

    fn request_mut(&mut self, request_id: PrimaryKey) -> Result<&mut GameRequestData> {
        self.requests
            .get_mut(&request_id)
            .ok_or_else(DatabaseError::request_not_found)
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn request_by_id(&self, request_id: PrimaryKey) -> Result<GameRequestData> {
        self.round_trip().await?;
        self.state.lock().request(request_id).cloned()
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<GameRequestData>> {
        self.round_trip().await?;

        let mut requests: Vec<_> = self
            .state
            .lock()
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        crate::sort_requests(&mut requests);

        Ok(requests)
    }

    async fn create_request(&self, new_request: NewRequest) -> Result<GameRequestData> {
        self.round_trip().await?;
        let mut state = self.state.lock();

        if state.requests.values().any(|r| new_request.duplicates(r)) {
            return Err(DatabaseError::Conflict {
                resource: "game request",
                field: "game:console",
                value: format!("{}:{}", new_request.game_title, new_request.console),
            });
        }

        let request = GameRequestData {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            requester: new_request.requester,
            game_title: new_request.game_title,
            game_image: new_request.game_image,
            catalog_id: new_request.catalog_id,
            console: new_request.console,
            status: RequestStatus::Pending,
            rejection_reason: None,
            available: false,
            upvotes: 0,
        };

        state.requests.insert(request.id, request.clone());

        Ok(request)
    }

    async fn update_request(&self, updated_request: UpdatedRequest) -> Result<GameRequestData> {
        self.round_trip().await?;
        let mut state = self.state.lock();

        let request = state.request_mut(updated_request.id)?;
        updated_request.apply_to(request);

        Ok(request.clone())
    }

    async fn delete_request(&self, request_id: PrimaryKey) -> Result<()> {
        self.round_trip().await?;
        let mut state = self.state.lock();

        state
            .requests
            .remove(&request_id)
            .ok_or_else(DatabaseError::request_not_found)?;
        state.votes.retain(|(id, _)| *id != request_id);

        Ok(())
    }

    async fn cast_vote(&self, request_id: PrimaryKey, voter_id: &str) -> Result<VoteOutcome> {
        self.round_trip().await?;
        let mut state = self.state.lock();

        let current = state.request(request_id)?.upvotes;

        if !state.votes.insert((request_id, voter_id.to_string())) {
            return Ok(VoteOutcome {
                success: false,
                already_voted: true,
                new_count: current,
            });
        }

        let request = state.request_mut(request_id)?;
        request.upvotes = request.upvotes.saturating_add(1);

        Ok(VoteOutcome {
            success: true,
            already_voted: false,
            new_count: request.upvotes,
        })
    }

    async fn remove_vote(&self, request_id: PrimaryKey, voter_id: &str) -> Result<VoteOutcome> {
        self.round_trip().await?;
        let mut state = self.state.lock();

        let current = state.request(request_id)?.upvotes;

        if !state.votes.remove(&(request_id, voter_id.to_string())) {
            return Ok(VoteOutcome {
                success: false,
                already_voted: false,
                new_count: current,
            });
        }

        let request = state.request_mut(request_id)?;
        request.upvotes = request.upvotes.saturating_sub(1);

        Ok(VoteOutcome {
            success: true,
            already_voted: true,
            new_count: request.upvotes,
        })
    }

    async fn vote_exists(&self, request_id: PrimaryKey, voter_id: &str) -> Result<bool> {
        self.round_trip().await?;

        Ok(self
            .state
            .lock()
            .votes
            .contains(&(request_id, voter_id.to_string())))
    }

    async fn config_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        self.round_trip().await?;
        Ok(self.state.lock().config.get(key).cloned())
    }

    async fn set_config_value(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.round_trip().await?;
        self.state.lock().config.insert(key.to_string(), value);

        Ok(())
    }
}
