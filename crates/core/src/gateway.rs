//! The backend gateway contract.
//!
//! The session talks to the backend exclusively through [`ClaimGateway`],
//! which keeps the reconciliation logic transport-agnostic: tests and demos
//! use [`crate::MemoryGateway`], production uses the networked gateway in
//! `claimstage-http`. The contract mirrors the backend's actual shape: the
//! combined update endpoint accepts additions only, so deletions must be
//! flushed through [`ClaimGateway::delete_media`] before an update is issued.

use crate::claim::{Claim, ClaimMedia};
use claimstage_types::{ClaimId, EditorId, IncidentTime, MediaId};

/// Errors surfaced by a gateway implementation.
///
/// These stay coarse on purpose: the session only distinguishes "which call
/// failed", not "why", and folds the detail into a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never completed (connection refused, DNS, broken pipe).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request exceeded its deadline.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The backend answered with a non-success status.
    #[error("backend rejected the request (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The backend answered with a body this client could not interpret.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

/// One new file carried by a combined update.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUpload {
    /// Raw file bytes.
    pub bytes: Vec<u8>,

    /// MIME type as reported by the file picker, e.g. `image/jpeg`.
    pub content_type: String,

    /// User-supplied description. Transmitted position-aligned with the
    /// file: the i-th description belongs to the i-th file.
    pub description: String,
}

impl std::fmt::Debug for NewUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUpload")
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("content_type", &self.content_type)
            .field("description", &self.description)
            .finish()
    }
}

/// The combined-update payload: edited scalar fields plus staged additions.
///
/// Additions only: this request has no way to express a deletion. Optional
/// fields follow the "don't guess" policy: an empty date and a
/// non-normalizable time are omitted, not rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Incident date, omitted when the form field is empty.
    pub date_of_incident: Option<String>,

    /// Incident time, omitted when the typed value could not be normalized.
    pub incident_time: Option<IncidentTime>,

    /// Always transmitted, even when unchanged.
    pub incident_location: String,

    /// Always transmitted; an empty description is valid.
    pub description: String,

    /// Staged uploads, in staging order.
    pub new_files: Vec<NewUpload>,

    /// The editing user, required by the backend.
    pub editor: EditorId,
}

/// Abstract backend operations needed by the reconciler.
#[async_trait::async_trait]
pub trait ClaimGateway: Send + Sync {
    /// Fetches a claim and its current (non-deleted) media collection.
    async fn fetch_claim(&self, id: &ClaimId)
        -> Result<(Claim, Vec<ClaimMedia>), GatewayError>;

    /// Deletes one media record. Independent of any other deletion.
    async fn delete_media(&self, id: &MediaId) -> Result<(), GatewayError>;

    /// Issues the combined additions-only update for one claim.
    async fn update_claim(
        &self,
        id: &ClaimId,
        update: UpdateRequest,
    ) -> Result<(), GatewayError>;
}
