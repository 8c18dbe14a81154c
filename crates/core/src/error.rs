//! Commit-boundary error kinds.
//!
//! Every gateway failure is caught inside the session and translated into
//! one of these kinds before it reaches the presentation layer; no raw
//! transport error crosses this boundary. The kinds are deliberately
//! distinguishable because they demand different user guidance: a
//! [`CommitError::UpdateFailure`] can be retried, while a
//! [`CommitError::RefreshFailure`] must not be, since the write already
//! happened.

use claimstage_types::MediaId;

/// Errors returned by [`crate::EditSession::commit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    /// Save was attempted while a required field is blank. Never reaches the
    /// gateway; pending state is untouched.
    #[error("cannot save: a required field is empty")]
    ValidationBlocked,

    /// Save was attempted while another commit on this session is still in
    /// flight. No network call was issued.
    #[error("a save is already in progress")]
    CommitInFlight,

    /// Save was attempted with no active edit on the session.
    #[error("no edit in progress")]
    NoActiveEdit,

    /// One or more marked deletions failed. Deletions that succeeded stand
    /// (deletion is not reversible through this flow); the update step was
    /// not attempted. A retry re-attempts only the ids listed here.
    #[error("failed to delete {} photo(s): {detail}", failed.len())]
    PartialDeletionFailure {
        /// Media ids whose deletion the backend rejected.
        failed: Vec<MediaId>,
        /// Human-readable detail from the first failure.
        detail: String,
    },

    /// The combined update call failed after all deletions succeeded.
    /// Pending field and file state is preserved for retry.
    #[error("failed to update claim: {detail}")]
    UpdateFailure { detail: String },

    /// The update succeeded server-side but the post-commit refetch failed.
    /// The edit is logically committed; local state is stale and the user
    /// should reload rather than retry the write.
    #[error("claim was saved but could not be reloaded: {detail}")]
    RefreshFailure { detail: String },
}

/// Result type for commit operations.
pub type CommitResult<T> = Result<T, CommitError>;
