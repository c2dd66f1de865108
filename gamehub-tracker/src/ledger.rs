use std::{sync::Arc, time::Duration};

use log::debug;

use crate::{util::with_timeout, Database, DatabaseError, PrimaryKey, VoteOutcome, VoterId};

/// The only way the upvote counter of a request changes.
///
/// Each voter gets at most one vote per request. The check and the counter
/// change are a single atomic operation in the database, so concurrent calls,
/// even from several server instances, can never count a voter twice.
pub struct UpvoteLedger {
    db: Arc<dyn Database>,
    timeout: Duration,
}

impl UpvoteLedger {
    pub fn new(db: &Arc<dyn Database>, timeout: Duration) -> Self {
        Self {
            db: db.clone(),
            timeout,
        }
    }

    /// Records a vote and increments the counter, unless the voter already voted.
    /// Voting twice is not an error, the outcome reports it with the current count.
    pub async fn cast_upvote(
        &self,
        request_id: PrimaryKey,
        voter: &VoterId,
    ) -> Result<VoteOutcome, DatabaseError> {
        let outcome =
            with_timeout(self.timeout, self.db.cast_vote(request_id, voter.as_str())).await?;

        debug!(
            "Upvote on {} by {}: counted={} count={}",
            request_id, voter, outcome.success, outcome.new_count
        );

        Ok(outcome)
    }

    /// Removes a vote and decrements the counter, if the voter had voted.
    /// The outcome is unsuccessful when there was nothing to remove.
    pub async fn remove_upvote(
        &self,
        request_id: PrimaryKey,
        voter: &VoterId,
    ) -> Result<VoteOutcome, DatabaseError> {
        let outcome =
            with_timeout(self.timeout, self.db.remove_vote(request_id, voter.as_str())).await?;

        debug!(
            "Upvote removal on {} by {}: removed={} count={}",
            request_id, voter, outcome.success, outcome.new_count
        );

        Ok(outcome)
    }

    /// Returns true if a vote by this voter exists for the request
    pub async fn has_voted(
        &self,
        request_id: PrimaryKey,
        voter: &VoterId,
    ) -> Result<bool, DatabaseError> {
        with_timeout(self.timeout, self.db.vote_exists(request_id, voter.as_str())).await
    }
}

#[cfg(test)]
mod tests {
    use futures_util::future::join_all;

    use super::*;
    use crate::{Console, GameRequestData, MemoryDatabase, NewRequest};

    async fn setup() -> (Arc<MemoryDatabase>, UpvoteLedger, GameRequestData) {
        let memory = Arc::new(MemoryDatabase::new());
        let db: Arc<dyn Database> = memory.clone();
        let ledger = UpvoteLedger::new(&db, Duration::from_secs(1));

        let request = db
            .create_request(NewRequest {
                requester: "Jane".to_string(),
                game_title: "Elden Ring".to_string(),
                game_image: None,
                catalog_id: None,
                console: Console::Ps5,
            })
            .await
            .unwrap();

        (memory, ledger, request)
    }

    fn voter(id: &str) -> VoterId {
        VoterId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn counts_a_voter_once() {
        let (_, ledger, request) = setup().await;
        let v1 = voter("voter-0001");

        let first = ledger.cast_upvote(request.id, &v1).await.unwrap();
        assert!(first.success);
        assert_eq!(first.new_count, 1);
        assert!(ledger.has_voted(request.id, &v1).await.unwrap());

        let second = ledger.cast_upvote(request.id, &v1).await.unwrap();
        assert!(!second.success);
        assert!(second.already_voted);
        assert_eq!(second.new_count, 1);
    }

    #[tokio::test]
    async fn concurrent_casts_count_once() {
        let (memory, ledger, request) = setup().await;
        let v1 = voter("voter-0001");

        let outcomes = join_all((0..32).map(|_| ledger.cast_upvote(request.id, &v1))).await;
        let outcomes: Vec<_> = outcomes.into_iter().map(Result::unwrap).collect();

        assert_eq!(outcomes.iter().filter(|o| o.success).count(), 1);
        assert!(outcomes.iter().all(|o| o.new_count == 1));
        assert_eq!(memory.vote_count(request.id), 1);
    }

    #[tokio::test]
    async fn cast_then_remove_restores_the_count() {
        let (memory, ledger, request) = setup().await;
        let v1 = voter("voter-0001");
        let v2 = voter("voter-0002");

        ledger.cast_upvote(request.id, &v2).await.unwrap();
        ledger.cast_upvote(request.id, &v1).await.unwrap();
        let removed = ledger.remove_upvote(request.id, &v1).await.unwrap();

        assert!(removed.success);
        assert_eq!(removed.new_count, 1);
        assert!(!ledger.has_voted(request.id, &v1).await.unwrap());
        assert_eq!(memory.vote_count(request.id), 1);
    }

    #[tokio::test]
    async fn counter_never_goes_below_zero() {
        let (_, ledger, request) = setup().await;
        let v1 = voter("voter-0001");

        for _ in 0..3 {
            let outcome = ledger.remove_upvote(request.id, &v1).await.unwrap();

            assert!(!outcome.success);
            assert_eq!(outcome.new_count, 0);
        }

        ledger.cast_upvote(request.id, &v1).await.unwrap();
        let outcomes = join_all((0..8).map(|_| ledger.remove_upvote(request.id, &v1))).await;

        assert_eq!(outcomes.iter().filter(|o| o.as_ref().unwrap().success).count(), 1);
        assert_eq!(
            ledger.remove_upvote(request.id, &v1).await.unwrap().new_count,
            0
        );
    }

    #[tokio::test]
    async fn votes_on_unknown_requests_are_not_found() {
        let (_, ledger, _) = setup().await;

        let result = ledger
            .cast_upvote(uuid::Uuid::new_v4(), &voter("voter-0001"))
            .await;

        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn unavailable_store_leaves_no_vote() {
        let (memory, ledger, request) = setup().await;
        let v1 = voter("voter-0001");

        memory.set_unavailable(true);
        let result = ledger.cast_upvote(request.id, &v1).await;
        assert!(matches!(result, Err(DatabaseError::Unavailable(_))));

        memory.set_unavailable(false);
        assert!(!ledger.has_voted(request.id, &v1).await.unwrap());
        assert_eq!(memory.vote_count(request.id), 0);
    }

    #[tokio::test]
    async fn timed_out_casts_leave_no_vote() {
        let (memory, _, request) = setup().await;
        let db: Arc<dyn Database> = memory.clone();
        let ledger = UpvoteLedger::new(&db, Duration::from_millis(10));
        let v1 = voter("voter-0001");

        memory.set_latency(Some(Duration::from_millis(200)));
        let result = ledger.cast_upvote(request.id, &v1).await;
        assert!(matches!(result, Err(DatabaseError::Unavailable(_))));

        memory.set_latency(None);
        assert_eq!(memory.vote_count(request.id), 0);
        assert_eq!(db.request_by_id(request.id).await.unwrap().upvotes, 0);
    }
}
