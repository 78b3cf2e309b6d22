//! Collaborator interfaces for remote and local side effects.
//!
//! Flows never reach for a concrete backend or a global session: every store
//! and service is passed in at construction time, so the submission logic can
//! be exercised against in-memory fakes.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors surfaced by remote collaborators.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("service error: {status} - {message}")]
    Service { status: u16, message: String },

    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("malformed submission payload: {0}")]
    Payload(String),
}

impl RemoteError {
    /// Transport-level failures are safe to save locally and replay later.
    /// Service-level rejections are not: the backend saw the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Network(_))
    }
}

/// How `upsert` treats fields that already exist on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Merge the given fields into the document, leaving others untouched.
    #[default]
    Merge,
    /// Replace the whole document with the given fields.
    #[allow(dead_code)]
    Replace,
}

/// Merge-write of a partial field set into a keyed remote document.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn upsert(
        &self,
        collection: &str,
        document_id: &str,
        fields: Map<String, Value>,
        merge: MergePolicy,
    ) -> Result<(), RemoteError>;
}

/// Opaque photo-report call. Returns whether the backend accepted the report.
///
/// The idempotency key must be reused when the same report is replayed from
/// the offline queue so the backend can drop duplicates.
#[async_trait]
pub trait ReportService: Send + Sync {
    async fn report_photo(
        &self,
        image_url: &str,
        subject_user_id: &str,
        reason: &str,
        idempotency_key: &str,
    ) -> Result<bool, RemoteError>;
}

/// Synchronous local key-value persistence for small preference blobs.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Invalidation signal for a dependent cached collection, fired after a
/// successful submission.
pub trait AggregateRefresh: Send + Sync {
    fn refresh(&self);
}

/// Refresh sink for flows with no dependent aggregate (e.g. interests).
pub struct NoRefresh;

impl AggregateRefresh for NoRefresh {
    fn refresh(&self) {}
}
