//! Presentation-facing session events.
//!
//! The presentation layer observes the session through this trait rather
//! than polling: re-render on `pending_changed`, disable save controls
//! between `commit_started` and the terminal `commit_succeeded` /
//! `commit_failed`. All methods default to no-ops so an observer implements
//! only what it renders.

use crate::claim::{Claim, ClaimMedia};
use crate::error::CommitError;

/// Observer for edit-session state transitions.
pub trait EditEvents: Send + Sync {
    /// Pending state changed: a field edit, a delete-mark toggle, a staged
    /// or unstaged file, a cancel, or a local removal after an immediate
    /// delete.
    fn pending_changed(&self) {}

    /// A commit passed validation and is about to issue gateway calls.
    fn commit_started(&self) {}

    /// A commit finished; `claim` and `media` are the refreshed server truth.
    fn commit_succeeded(&self, claim: &Claim, media: &[ClaimMedia]) {
        let _ = (claim, media);
    }

    /// A commit failed. `CommitInFlight` is not reported here: the commit
    /// that is actually running will report its own outcome.
    fn commit_failed(&self, error: &CommitError) {
        let _ = error;
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEvents;

impl EditEvents for NullEvents {}
