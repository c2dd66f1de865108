use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::PgPoolOptions, query, query_as, query_scalar, Error as SqlxError, FromRow, PgPool,
};
use uuid::Uuid;

use crate::{
    Database, DatabaseError, DatabaseResult, GameRequestData, IntoDatabaseError, NewRequest,
    PrimaryKey, RequestFilter, Result, UpdatedRequest, VoteOutcome,
};

/// A postgres database implementation for gamehub
pub struct PgDatabase {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct GameRequestRow {
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
    upvotes: i32,
}

impl PgDatabase {
    /// Connects to the database and brings the schema up to date
    pub async fn new(url: &str, acquire_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Unavailable(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }

    async fn duplicate_of(&self, new_request: &NewRequest) -> Result<GameRequestData> {
        query_as::<_, GameRequestRow>(
            "
            SELECT * FROM game_requests
            WHERE console = $1
                AND (
                    lower(btrim(game_title)) = lower(btrim($2))
                    OR (catalog_id IS NOT NULL AND catalog_id = $3)
                )
            LIMIT 1",
        )
        .bind(new_request.console.as_str())
        .bind(&new_request.game_title)
        .bind(new_request.catalog_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("game request", "game:console"))?
        .try_into()
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn request_by_id(&self, request_id: PrimaryKey) -> Result<GameRequestData> {
        query_as::<_, GameRequestRow>("SELECT * FROM game_requests WHERE id = $1")
            .bind(request_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("game request", "id"))?
            .try_into()
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<GameRequestData>> {
        query_as::<_, GameRequestRow>(
            "
            SELECT * FROM game_requests
            WHERE ($1::text IS NULL OR status = $1)
                AND ($2::text IS NULL OR console = $2)
                AND ($3::bigint IS NULL OR catalog_id = $3)
            ORDER BY upvotes DESC, created_at DESC",
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.console.map(|c| c.as_str()))
        .bind(filter.catalog_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
    }

    async fn create_request(&self, new_request: NewRequest) -> Result<GameRequestData> {
        let description = format!("{}:{}", new_request.game_title, new_request.console);

        self.duplicate_of(&new_request)
            .await
            .conflict_or_ok("game request", "game:console", &description)?;

        query_as::<_, GameRequestRow>(
            "
            INSERT INTO game_requests (id, requester, game_title, game_image, catalog_id, console)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new_request.requester)
        .bind(&new_request.game_title)
        .bind(&new_request.game_image)
        .bind(new_request.catalog_id)
        .bind(new_request.console.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // A concurrent insert won the race past the check above
            SqlxError::Database(db) if db.is_unique_violation() => DatabaseError::Conflict {
                resource: "game request",
                field: "game:console",
                value: description.clone(),
            },
            e => e.any(),
        })?
        .try_into()
    }

    async fn update_request(&self, updated_request: UpdatedRequest) -> Result<GameRequestData> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let mut request: GameRequestData = query_as::<_, GameRequestRow>(
            "SELECT * FROM game_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(updated_request.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.not_found_or("game request", "id"))?
        .try_into()?;

        updated_request.apply_to(&mut request);

        let row = query_as::<_, GameRequestRow>(
            "
            UPDATE game_requests SET
                status = $1,
                rejection_reason = $2,
                available = $3,
                upvotes = $4
            WHERE id = $5
            RETURNING *",
        )
        .bind(request.status.as_str())
        .bind(&request.rejection_reason)
        .bind(request.available)
        .bind(to_counter(request.upvotes))
        .bind(request.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())?;

        row.try_into()
    }

    async fn delete_request(&self, request_id: PrimaryKey) -> Result<()> {
        // Votes go with it through ON DELETE CASCADE
        let result = query("DELETE FROM game_requests WHERE id = $1")
            .bind(request_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::request_not_found());
        }

        Ok(())
    }

    async fn cast_vote(&self, request_id: PrimaryKey, voter_id: &str) -> Result<VoteOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let current = query_scalar::<_, i32>(
            "SELECT upvotes FROM game_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.not_found_or("game request", "id"))?;

        let inserted = query(
            "
            INSERT INTO request_votes (request_id, voter_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING",
        )
        .bind(request_id)
        .bind(voter_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| e.any())?
        .rows_affected();

        if inserted == 0 {
            tx.commit().await.map_err(|e| e.any())?;

            return Ok(VoteOutcome {
                success: false,
                already_voted: true,
                new_count: from_counter(current),
            });
        }

        let new_count = query_scalar::<_, i32>(
            "UPDATE game_requests SET upvotes = upvotes + 1 WHERE id = $1 RETURNING upvotes",
        )
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())?;

        Ok(VoteOutcome {
            success: true,
            already_voted: false,
            new_count: from_counter(new_count),
        })
    }

    async fn remove_vote(&self, request_id: PrimaryKey, voter_id: &str) -> Result<VoteOutcome> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let current = query_scalar::<_, i32>(
            "SELECT upvotes FROM game_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.not_found_or("game request", "id"))?;

        let deleted = query("DELETE FROM request_votes WHERE request_id = $1 AND voter_id = $2")
            .bind(request_id)
            .bind(voter_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?
            .rows_affected();

        if deleted == 0 {
            tx.commit().await.map_err(|e| e.any())?;

            return Ok(VoteOutcome {
                success: false,
                already_voted: false,
                new_count: from_counter(current),
            });
        }

        let new_count = query_scalar::<_, i32>(
            "
            UPDATE game_requests SET upvotes = GREATEST(upvotes - 1, 0)
            WHERE id = $1
            RETURNING upvotes",
        )
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())?;

        Ok(VoteOutcome {
            success: true,
            already_voted: true,
            new_count: from_counter(new_count),
        })
    }

    async fn vote_exists(&self, request_id: PrimaryKey, voter_id: &str) -> Result<bool> {
        query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM request_votes WHERE request_id = $1 AND voter_id = $2)",
        )
        .bind(request_id)
        .bind(voter_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn config_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        query_scalar::<_, serde_json::Value>("SELECT value FROM app_config WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn set_config_value(&self, key: &str, value: serde_json::Value) -> Result<()> {
        query(
            "
            INSERT INTO app_config (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())
        .map(|_| ())
    }
}

impl TryFrom<GameRequestRow> for GameRequestData {
    type Error = DatabaseError;

    fn try_from(row: GameRequestRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            created_at: row.created_at,
            requester: row.requester,
            game_title: row.game_title,
            game_image: row.game_image,
            catalog_id: row.catalog_id,
            console: row
                .console
                .parse()
                .map_err(|e| DatabaseError::Internal(Box::new(e)))?,
            status: row
                .status
                .parse()
                .map_err(|e| DatabaseError::Internal(Box::new(e)))?,
            rejection_reason: row.rejection_reason,
            available: row.available,
            upvotes: from_counter(row.upvotes),
        })
    }
}

fn from_counter(value: i32) -> u32 {
    value.max(0) as u32
}

fn to_counter(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        match self {
            SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
                DatabaseError::Unavailable(self.to_string())
            }
            e => DatabaseError::Internal(Box::new(e)),
        }
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}
