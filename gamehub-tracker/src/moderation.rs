//! Admin triage of requests: status transitions, availability and deletion.
//!
//! Every operation takes an [AdminSession], so only verified admins get here.
//! Field coupling is enforced in [UpdatedRequest::apply_to], which the
//! database runs while it holds the request exclusively:
//!
//! - a rejection reason only survives while the request is rejected
//! - a request is only available while it is approved

use std::{sync::Arc, time::Duration};

use log::info;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    util::with_timeout, AdminSession, Database, DatabaseError, GameRequestData, PrimaryKey,
    RequestStatus, UpdatedRequest,
};

pub struct ModerationWorkflow {
    db: Arc<dyn Database>,
    timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ModerationError {
    /// The update didn't contain a single recognized field
    #[error("No valid updates")]
    EmptyUpdate,
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

/// The moderation fields an admin asked to change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModerationPatch {
    pub status: Option<RequestStatus>,
    /// `Some(None)` clears the reason
    pub rejection_reason: Option<Option<String>>,
    pub available: Option<bool>,
    pub upvotes: Option<u32>,
}

impl ModerationPatch {
    /// Reads a patch from a JSON object.
    /// Unknown keys are ignored, known keys must have the right type.
    pub fn from_json(value: &Value) -> Result<Self, ModerationError> {
        let object = value.as_object().ok_or(ModerationError::InvalidField {
            field: "body",
            reason: "expected an object",
        })?;

        let patch = Self {
            status: Self::status(object)?,
            rejection_reason: Self::rejection_reason(object)?,
            available: Self::available(object)?,
            upvotes: Self::upvotes(object)?,
        };

        if patch.is_empty() {
            return Err(ModerationError::EmptyUpdate);
        }

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.rejection_reason.is_none()
            && self.available.is_none()
            && self.upvotes.is_none()
    }

    fn status(object: &Map<String, Value>) -> Result<Option<RequestStatus>, ModerationError> {
        let Some(value) = object.get("status") else {
            return Ok(None);
        };

        value
            .as_str()
            .and_then(|s| s.parse().ok())
            .map(Some)
            .ok_or(ModerationError::InvalidField {
                field: "status",
                reason: "expected one of Pending, Approved, Rejected",
            })
    }

    fn rejection_reason(
        object: &Map<String, Value>,
    ) -> Result<Option<Option<String>>, ModerationError> {
        let value = object
            .get("rejectionReason")
            .or_else(|| object.get("rejection_reason"));

        match value {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(Value::String(reason)) => {
                let reason = reason.trim();
                Ok(Some((!reason.is_empty()).then(|| reason.to_string())))
            }
            Some(_) => Err(ModerationError::InvalidField {
                field: "rejectionReason",
                reason: "expected a string or null",
            }),
        }
    }

    fn available(object: &Map<String, Value>) -> Result<Option<bool>, ModerationError> {
        match object.get("available") {
            None => Ok(None),
            Some(Value::Bool(available)) => Ok(Some(*available)),
            Some(_) => Err(ModerationError::InvalidField {
                field: "available",
                reason: "expected a boolean",
            }),
        }
    }

    fn upvotes(object: &Map<String, Value>) -> Result<Option<u32>, ModerationError> {
        let Some(value) = object.get("upvotes") else {
            return Ok(None);
        };

        // The stored counter is a signed 32 bit column
        value
            .as_u64()
            .and_then(|n| i32::try_from(n).ok())
            .map(|n| Some(n as u32))
            .ok_or(ModerationError::InvalidField {
                field: "upvotes",
                reason: "expected an integer from 0 to 2147483647",
            })
    }
}

impl UpdatedRequest {
    /// Applies the update to a request, normalizing fields that depend on the status
    pub fn apply_to(&self, request: &mut GameRequestData) {
        if let Some(status) = self.status {
            request.status = status;
        }

        match request.status {
            RequestStatus::Rejected => {
                if let Some(reason) = &self.rejection_reason {
                    request.rejection_reason = reason.clone();
                }
            }
            _ => request.rejection_reason = None,
        }

        if let Some(available) = self.available {
            request.available = available;
        }

        if request.status != RequestStatus::Approved {
            request.available = false;
        }

        if let Some(upvotes) = self.upvotes {
            request.upvotes = upvotes;
        }
    }
}

impl ModerationWorkflow {
    pub fn new(db: &Arc<dyn Database>, timeout: Duration) -> Self {
        Self {
            db: db.clone(),
            timeout,
        }
    }

    /// Changes the moderation fields of a request
    pub async fn update_request(
        &self,
        _session: &AdminSession,
        request_id: PrimaryKey,
        patch: ModerationPatch,
    ) -> Result<GameRequestData, ModerationError> {
        if patch.is_empty() {
            return Err(ModerationError::EmptyUpdate);
        }

        let updated = UpdatedRequest {
            id: request_id,
            status: patch.status,
            rejection_reason: patch.rejection_reason,
            available: patch.available,
            upvotes: patch.upvotes,
        };

        let request = with_timeout(self.timeout, self.db.update_request(updated)).await?;

        info!(
            "Request {} is now {} (available: {})",
            request.id, request.status, request.available
        );

        Ok(request)
    }

    /// Permanently removes a request and its votes
    pub async fn delete_request(
        &self,
        _session: &AdminSession,
        request_id: PrimaryKey,
    ) -> Result<(), ModerationError> {
        with_timeout(self.timeout, self.db.delete_request(request_id)).await?;
        info!("Deleted request {}", request_id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{AdminAuth, Console, MemoryDatabase, NewRequest};

    struct Setup {
        db: Arc<dyn Database>,
        workflow: ModerationWorkflow,
        session: AdminSession,
        request: GameRequestData,
    }

    async fn setup() -> Setup {
        let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
        let workflow = ModerationWorkflow::new(&db, Duration::from_secs(1));
        let session = AdminAuth::new(Some("secret".to_string()), None)
            .login("secret")
            .unwrap();

        let request = db
            .create_request(NewRequest {
                requester: "Jane".to_string(),
                game_title: "Elden Ring".to_string(),
                game_image: None,
                catalog_id: Some(326243),
                console: Console::Ps5,
            })
            .await
            .unwrap();

        Setup {
            db,
            workflow,
            session,
            request,
        }
    }

    fn patch(value: Value) -> ModerationPatch {
        ModerationPatch::from_json(&value).unwrap()
    }

    #[test]
    fn parses_recognized_fields() {
        let parsed = patch(json!({
            "status": "Rejected",
            "rejectionReason": "Over budget",
            "available": false,
            "upvotes": 4,
            "requester": "ignored"
        }));

        assert_eq!(
            parsed,
            ModerationPatch {
                status: Some(RequestStatus::Rejected),
                rejection_reason: Some(Some("Over budget".to_string())),
                available: Some(false),
                upvotes: Some(4),
            }
        );

        assert_eq!(
            patch(json!({ "rejection_reason": null })).rejection_reason,
            Some(None)
        );
    }

    #[test]
    fn refuses_empty_or_mistyped_patches() {
        let largest = ModerationPatch::from_json(&json!({ "upvotes": 2147483647 })).unwrap();
        assert_eq!(largest.upvotes, Some(i32::MAX as u32));

        for value in [json!({}), json!({ "requester": "Bob" })] {
            assert!(matches!(
                ModerationPatch::from_json(&value),
                Err(ModerationError::EmptyUpdate)
            ));
        }

        for value in [
            json!({ "status": "Done" }),
            json!({ "status": 1 }),
            json!({ "available": "yes" }),
            json!({ "upvotes": -1 }),
            json!({ "upvotes": 2147483648u64 }),
            json!({ "upvotes": 1.5 }),
            json!({ "rejectionReason": 3 }),
            json!([]),
        ] {
            assert!(matches!(
                ModerationPatch::from_json(&value),
                Err(ModerationError::InvalidField { .. })
            ));
        }
    }

    #[tokio::test]
    async fn approving_clears_the_rejection_reason() {
        let s = setup().await;

        let rejected = s
            .workflow
            .update_request(
                &s.session,
                s.request.id,
                patch(json!({ "status": "Rejected", "rejectionReason": "Over budget" })),
            )
            .await
            .unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Over budget"));

        let approved = s
            .workflow
            .update_request(
                &s.session,
                s.request.id,
                patch(json!({ "status": "Approved", "available": true })),
            )
            .await
            .unwrap();

        assert_eq!(approved.status, RequestStatus::Approved);
        assert!(approved.available);
        assert_eq!(approved.rejection_reason, None);
    }

    #[tokio::test]
    async fn rejecting_keeps_an_existing_reason_and_never_invents_one() {
        let s = setup().await;

        let rejected = s
            .workflow
            .update_request(&s.session, s.request.id, patch(json!({ "status": "Rejected" })))
            .await
            .unwrap();
        assert_eq!(rejected.rejection_reason, None);

        s.workflow
            .update_request(
                &s.session,
                s.request.id,
                patch(json!({ "rejectionReason": "Not suitable for office" })),
            )
            .await
            .unwrap();

        let still_rejected = s
            .workflow
            .update_request(&s.session, s.request.id, patch(json!({ "status": "Rejected" })))
            .await
            .unwrap();
        assert_eq!(
            still_rejected.rejection_reason.as_deref(),
            Some("Not suitable for office")
        );
    }

    #[tokio::test]
    async fn availability_requires_approval() {
        let s = setup().await;

        let pending = s
            .workflow
            .update_request(&s.session, s.request.id, patch(json!({ "available": true })))
            .await
            .unwrap();
        assert!(!pending.available);

        s.workflow
            .update_request(
                &s.session,
                s.request.id,
                patch(json!({ "status": "Approved", "available": true })),
            )
            .await
            .unwrap();

        let reopened = s
            .workflow
            .update_request(&s.session, s.request.id, patch(json!({ "status": "Pending" })))
            .await
            .unwrap();
        assert!(!reopened.available);
    }

    #[tokio::test]
    async fn admins_can_correct_the_counter() {
        let s = setup().await;

        let corrected = s
            .workflow
            .update_request(&s.session, s.request.id, patch(json!({ "upvotes": 12 })))
            .await
            .unwrap();

        assert_eq!(corrected.upvotes, 12);
        assert_eq!(corrected.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn deletes_requests_once() {
        let s = setup().await;

        s.workflow
            .delete_request(&s.session, s.request.id)
            .await
            .unwrap();

        assert!(matches!(
            s.db.request_by_id(s.request.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(matches!(
            s.workflow.delete_request(&s.session, s.request.id).await,
            Err(ModerationError::Db(DatabaseError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn updates_to_unknown_requests_are_not_found() {
        let s = setup().await;

        let result = s
            .workflow
            .update_request(
                &s.session,
                uuid::Uuid::new_v4(),
                patch(json!({ "status": "Approved" })),
            )
            .await;

        assert!(matches!(
            result,
            Err(ModerationError::Db(DatabaseError::NotFound { .. }))
        ));
    }
}
