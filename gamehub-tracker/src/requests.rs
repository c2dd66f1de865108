use std::{sync::Arc, time::Duration};

use log::{info, warn};
use thiserror::Error;

use crate::{
    util::with_timeout, AdminSession, Analytics, Catalog, Console, Database, DatabaseError,
    GameRequestData, NewRequest, PrimaryKey, RequestFilter,
};

/// Submits and reads game requests
pub struct RequestDesk {
    db: Arc<dyn Database>,
    catalog: Option<Arc<dyn Catalog>>,
    timeout: Duration,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("A game title is required")]
    MissingTitle,
    /// The same game is already requested for the console
    #[error("A request for {title} on {console} already exists")]
    Duplicate { title: String, console: Console },
    #[error(transparent)]
    Db(DatabaseError),
}

/// A request as submitted by a user
#[derive(Debug, Clone)]
pub struct Submission {
    pub requester: Option<String>,
    pub game_title: Option<String>,
    pub game_image: Option<String>,
    pub catalog_id: Option<i64>,
    pub console: Console,
}

impl RequestDesk {
    const ANONYMOUS: &'static str = "Anonymous";

    pub fn new(
        db: &Arc<dyn Database>,
        catalog: Option<&Arc<dyn Catalog>>,
        timeout: Duration,
    ) -> Self {
        Self {
            db: db.clone(),
            catalog: catalog.cloned(),
            timeout,
        }
    }

    /// Creates a pending request.
    /// Title and image come from the catalog when it knows the game.
    pub async fn submit(&self, submission: Submission) -> Result<GameRequestData, SubmissionError> {
        let (catalog_title, catalog_image) = self.enrich(submission.catalog_id).await;

        let game_title = catalog_title
            .or(submission.game_title)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(SubmissionError::MissingTitle)?;

        let requester = submission
            .requester
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| Self::ANONYMOUS.to_string());

        let new_request = NewRequest {
            requester,
            game_title,
            game_image: catalog_image.or(submission.game_image),
            catalog_id: submission.catalog_id,
            console: submission.console,
        };

        let title = new_request.game_title.clone();
        let console = new_request.console;

        let request = with_timeout(self.timeout, self.db.create_request(new_request))
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict { .. } => SubmissionError::Duplicate { title, console },
                e => SubmissionError::Db(e),
            })?;

        info!(
            "New request for {} on {} by {}",
            request.game_title, request.console, request.requester
        );

        Ok(request)
    }

    pub async fn request(&self, request_id: PrimaryKey) -> Result<GameRequestData, DatabaseError> {
        with_timeout(self.timeout, self.db.request_by_id(request_id)).await
    }

    /// Lists requests, most upvoted first
    pub async fn list(&self, filter: &RequestFilter) -> Result<Vec<GameRequestData>, DatabaseError> {
        with_timeout(self.timeout, self.db.list_requests(filter)).await
    }

    pub async fn analytics(&self, _session: &AdminSession) -> Result<Analytics, DatabaseError> {
        let requests = self.list(&RequestFilter::default()).await?;

        Ok(Analytics::from_requests(requests))
    }

    /// Best-effort lookup of the display fields, a failing catalog never blocks a submission
    async fn enrich(&self, catalog_id: Option<i64>) -> (Option<String>, Option<String>) {
        let (Some(catalog), Some(id)) = (&self.catalog, catalog_id) else {
            return (None, None);
        };

        match catalog.game(id).await {
            Ok(game) => (Some(game.name), game.background_image),
            Err(e) => {
                warn!("Could not enrich request from catalog game {}: {}", id, e);
                (None, None)
            }
        }
    }
}
