//! The staged edit session.
//!
//! An [`EditSession`] owns the pending edit for one claim and turns a bundle
//! of independent user intents into a single save that reaches the backend
//! in a deterministic, partially recoverable sequence:
//!
//! 1. Marked deletions are fanned out concurrently and joined as a set:
//!    deletions are independent of each other, so one failure must neither
//!    abort the others early nor let the commit race ahead on the first
//!    completion.
//! 2. If any deletion failed, the commit stops. Succeeded deletions stand
//!    (they are not reversible through this flow) and are dropped from the
//!    pending state so a retry re-attempts only the stragglers.
//! 3. One combined additions-only update carries the edited fields, every
//!    staged file with its position-aligned description, and the editor id.
//! 4. On success the claim is refetched: the source of truth after a write
//!    is a fresh read, since the backend may normalize dates, assign media
//!    ids, or apply defaults.
//! 5. Staged previews are released and the pending edit is cleared.
//!
//! The session is shareable (`&self` methods, interior locking) so a
//! presentation layer can hold it behind an `Arc`. A second `commit` while
//! one is outstanding is rejected before any network call is issued.

use crate::claim::{Claim, ClaimField, ClaimFields, ClaimMedia};
use crate::config::SessionConfig;
use crate::error::{CommitError, CommitResult};
use crate::events::EditEvents;
use crate::gateway::{ClaimGateway, GatewayError, NewUpload, UpdateRequest};
use crate::pending::{PendingEdit, StagedFile};
use crate::preview::{PreviewRef, PreviewStore};
use claimstage_types::{IncidentTime, MediaId, StagedId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Presentation-facing view of one staged upload (no payload bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpload {
    pub id: StagedId,
    pub description: String,
    pub preview: PreviewRef,
    pub size_bytes: usize,
}

struct SessionState {
    claim: Claim,
    media: Vec<ClaimMedia>,
    pending: Option<PendingEdit>,
}

/// Staged-edit reconciler for one claim and its media collection.
pub struct EditSession {
    gateway: Arc<dyn ClaimGateway>,
    previews: Arc<dyn PreviewStore>,
    events: Arc<dyn EditEvents>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    commit_in_flight: AtomicBool,
}

impl EditSession {
    /// Creates a session over the most recently fetched server state.
    pub fn new(
        gateway: Arc<dyn ClaimGateway>,
        previews: Arc<dyn PreviewStore>,
        events: Arc<dyn EditEvents>,
        config: SessionConfig,
        claim: Claim,
        media: Vec<ClaimMedia>,
    ) -> Self {
        Self {
            gateway,
            previews,
            events,
            config,
            state: Mutex::new(SessionState {
                claim,
                media,
                pending: None,
            }),
            commit_in_flight: AtomicBool::new(false),
        }
    }

    /// The claim as last confirmed by the backend.
    pub fn claim(&self) -> Claim {
        self.lock().claim.clone()
    }

    /// The media collection as last confirmed by the backend, minus any
    /// rows removed by an immediate or committed deletion.
    pub fn media(&self) -> Vec<ClaimMedia> {
        self.lock().media.clone()
    }

    /// True while a pending edit exists.
    pub fn is_editing(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Enters edit mode by snapshotting the claim's editable fields.
    ///
    /// A no-op when an edit is already active: re-entering edit mode must
    /// not clobber work the user has already staged.
    pub fn begin_edit(&self) {
        let mut state = self.lock();
        if state.pending.is_some() {
            tracing::debug!(claim = %state.claim.id, "begin_edit with an active edit; keeping it");
            return;
        }
        state.pending = Some(PendingEdit::new(state.claim.fields.clone()));
        drop(state);
        self.events.pending_changed();
    }

    /// The pending field snapshot, when editing.
    pub fn fields(&self) -> Option<ClaimFields> {
        self.lock().pending.as_ref().map(|p| p.fields().clone())
    }

    /// Sets one field in the pending snapshot. No validation happens here;
    /// required fields gate the save lazily. A no-op when not editing.
    pub fn set_field(&self, field: ClaimField, value: impl Into<String>) {
        let mut state = self.lock();
        let Some(pending) = state.pending.as_mut() else {
            tracing::debug!("set_field without an active edit; ignoring");
            return;
        };
        pending.set_field(field, value);
        drop(state);
        self.events.pending_changed();
    }

    /// Toggles the delete mark on a loaded media row.
    ///
    /// Fails silently for an id that is not in the loaded collection: the
    /// presentation layer only offers valid ids, so an unknown one means a
    /// stale view, not a user mistake worth surfacing.
    pub fn toggle_delete_mark(&self, id: &MediaId) {
        let mut state = self.lock();
        let known = state.media.iter().any(|row| &row.id == id && !row.is_deleted);
        let Some(pending) = state.pending.as_mut() else {
            return;
        };
        if !known {
            tracing::debug!(media = %id, "delete-mark toggle for unknown media id; ignoring");
            return;
        }
        pending.toggle_delete_mark(id.clone());
        drop(state);
        self.events.pending_changed();
    }

    /// Media ids currently marked for deletion.
    pub fn marked_for_delete(&self) -> Vec<MediaId> {
        self.lock()
            .pending
            .as_ref()
            .map(|p| p.delete_marks().cloned().collect())
            .unwrap_or_default()
    }

    /// Stages a new file for upload, returning its staging identifier so the
    /// caller can amend or remove it later. Returns `None` when not editing.
    pub fn stage_new_file(
        &self,
        bytes: Vec<u8>,
        content_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Option<StagedId> {
        let content_type = content_type.into();
        let preview = self.previews.create(&bytes, &content_type);

        let mut state = self.lock();
        let Some(pending) = state.pending.as_mut() else {
            drop(state);
            // Nothing will ever own this preview; release it straight away.
            self.previews.release(&preview);
            tracing::debug!("stage_new_file without an active edit; ignoring");
            return None;
        };

        let id = StagedId::new();
        pending.push_staged(StagedFile {
            id: id.clone(),
            bytes,
            content_type,
            description: description.into(),
            preview,
        });
        drop(state);
        self.events.pending_changed();
        Some(id)
    }

    /// Amends the description of a staged upload. No-op for an unknown id.
    pub fn set_staged_description(&self, id: &StagedId, description: impl Into<String>) {
        let mut state = self.lock();
        if let Some(pending) = state.pending.as_mut() {
            pending.set_staged_description(id, description);
            drop(state);
            self.events.pending_changed();
        }
    }

    /// Removes a staged upload and releases its preview. Idempotent: calling
    /// it again for the same id (or for an id never staged) is not an error.
    pub fn unstage_new_file(&self, id: &StagedId) {
        let removed = {
            let mut state = self.lock();
            state.pending.as_mut().and_then(|p| p.remove_staged(id))
        };
        if let Some(file) = removed {
            self.previews.release(&file.preview);
            self.events.pending_changed();
        }
    }

    /// Staged uploads in staging order, without payload bytes.
    pub fn staged_uploads(&self) -> Vec<StagedUpload> {
        self.lock()
            .pending
            .as_ref()
            .map(|p| {
                p.staged()
                    .iter()
                    .map(|file| StagedUpload {
                        id: file.id.clone(),
                        description: file.description.clone(),
                        preview: file.preview.clone(),
                        size_bytes: file.bytes.len(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Pure save gate: true only when editing and every configured required
    /// field is non-blank. Independent of staged media changes.
    pub fn can_save(&self) -> bool {
        self.lock()
            .pending
            .as_ref()
            .map(|p| p.fields().satisfies(self.config.required_fields()))
            .unwrap_or(false)
    }

    /// Discards the pending edit and releases every staged preview.
    /// No backend calls. A no-op when not editing.
    pub fn cancel(&self) {
        let taken = self.lock().pending.take();
        let Some(mut pending) = taken else { return };
        for file in pending.drain_staged() {
            self.previews.release(&file.preview);
        }
        self.events.pending_changed();
    }

    /// Deletes one media row immediately, outside the staged flow.
    ///
    /// On success the row and any delete mark on it are removed locally; no
    /// refetch is needed because deletion has no server-computed result.
    pub async fn delete_media_now(&self, id: &MediaId) -> Result<(), GatewayError> {
        self.gateway.delete_media(id).await?;
        let mut state = self.lock();
        state.media.retain(|row| &row.id != id);
        if let Some(pending) = state.pending.as_mut() {
            pending.clear_delete_mark(id);
        }
        drop(state);
        self.events.pending_changed();
        Ok(())
    }

    /// Commits the pending edit: deletions, combined update, refresh.
    ///
    /// On success, returns the refreshed claim and media and clears the
    /// pending edit. On failure, pending state is left intact so the user
    /// can retry, except after [`CommitError::RefreshFailure`], where the
    /// write is durable and the pending edit is cleared (retrying would
    /// repeat a write that already happened).
    ///
    /// # Errors
    ///
    /// See [`CommitError`] for the kinds and their retry semantics.
    pub async fn commit(&self) -> CommitResult<(Claim, Vec<ClaimMedia>)> {
        // Reject overlap before touching anything; the running commit will
        // report its own outcome.
        let Some(_guard) = InFlightGuard::acquire(&self.commit_in_flight) else {
            return Err(CommitError::CommitInFlight);
        };

        // Snapshot under the lock; the lock is never held across an await
        // and never held while the observer is called.
        let snapshot = {
            let state = self.lock();
            match state.pending.as_ref() {
                None => Err(CommitError::NoActiveEdit),
                Some(pending)
                    if !pending.fields().satisfies(self.config.required_fields()) =>
                {
                    Err(CommitError::ValidationBlocked)
                }
                Some(pending) => {
                    let delete_ids: Vec<MediaId> = pending.delete_marks().cloned().collect();
                    let request =
                        build_update_request(pending.fields(), pending.staged(), &self.config);
                    Ok((state.claim.id.clone(), delete_ids, request))
                }
            }
        };
        let (claim_id, delete_ids, request) = match snapshot {
            Ok(parts) => parts,
            Err(error) => return Err(self.fail(error)),
        };

        self.events.commit_started();
        tracing::debug!(
            claim = %claim_id,
            deletions = delete_ids.len(),
            new_files = request.new_files.len(),
            "commit started"
        );

        // Fan out the marked deletions and join on all of them. Partial
        // success must be assessed as a set: no racing ahead on the first
        // completion, no failing fast on the first error.
        if !delete_ids.is_empty() {
            let outcomes = futures::future::join_all(delete_ids.into_iter().map(|id| {
                let gateway = Arc::clone(&self.gateway);
                async move {
                    let outcome = gateway.delete_media(&id).await;
                    (id, outcome)
                }
            }))
            .await;

            let mut failed = Vec::new();
            let mut first_detail = String::new();
            {
                let mut state = self.lock();
                for (id, outcome) in outcomes {
                    match outcome {
                        Ok(()) => {
                            // Succeeded deletions stand. Drop them from the
                            // pending state and the loaded view so a retry
                            // only re-attempts what is still present.
                            if let Some(pending) = state.pending.as_mut() {
                                pending.clear_delete_mark(&id);
                            }
                            state.media.retain(|row| row.id != id);
                        }
                        Err(err) => {
                            if first_detail.is_empty() {
                                first_detail = err.to_string();
                            }
                            failed.push(id);
                        }
                    }
                }
            }

            if !failed.is_empty() {
                tracing::warn!(
                    claim = %claim_id,
                    failed = failed.len(),
                    "commit aborted after partial deletion failure"
                );
                self.events.pending_changed();
                return Err(self.fail(CommitError::PartialDeletionFailure {
                    failed,
                    detail: first_detail,
                }));
            }
        }

        // One combined additions-only update. An empty pending edit still
        // issues this call: per-field dirtiness is not tracked, and a
        // redundant update is simpler to reason about than a skipped one.
        if let Err(err) = self.gateway.update_claim(&claim_id, request).await {
            tracing::warn!(claim = %claim_id, error = %err, "combined update failed");
            return Err(self.fail(CommitError::UpdateFailure {
                detail: err.to_string(),
            }));
        }

        // Source-of-truth refresh: trust a fresh read, not a local
        // reconstruction of what the backend probably did.
        match self.gateway.fetch_claim(&claim_id).await {
            Ok((claim, media)) => {
                {
                    let mut state = self.lock();
                    state.claim = claim.clone();
                    state.media = media.clone();
                    self.clear_pending(&mut state);
                }
                tracing::debug!(claim = %claim_id, "commit succeeded");
                self.events.commit_succeeded(&claim, &media);
                Ok((claim, media))
            }
            Err(err) => {
                // The write is durable; the pending edit must not be
                // retried. Clear it and tell the caller to reload.
                {
                    let mut state = self.lock();
                    self.clear_pending(&mut state);
                }
                tracing::warn!(claim = %claim_id, error = %err, "post-commit refresh failed");
                Err(self.fail(CommitError::RefreshFailure {
                    detail: err.to_string(),
                }))
            }
        }
    }

    /// Drops the pending edit, releasing every staged preview.
    fn clear_pending(&self, state: &mut SessionState) {
        if let Some(mut pending) = state.pending.take() {
            for file in pending.drain_staged() {
                self.previews.release(&file.preview);
            }
        }
    }

    /// Reports a commit failure to the observer and hands the error back.
    fn fail(&self, error: CommitError) -> CommitError {
        self.events.commit_failed(&error);
        error
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("edit session lock poisoned")
    }
}

/// Builds the combined-update payload from the pending snapshot.
///
/// The "don't guess" policy applies here: an empty date and a time that does
/// not normalize are omitted from the payload, never rejected.
fn build_update_request(
    fields: &ClaimFields,
    staged: &[StagedFile],
    config: &SessionConfig,
) -> UpdateRequest {
    let date_of_incident = if fields.date_of_incident.trim().is_empty() {
        None
    } else {
        Some(fields.date_of_incident.clone())
    };

    UpdateRequest {
        date_of_incident,
        incident_time: IncidentTime::parse(&fields.incident_time),
        incident_location: fields.incident_location.clone(),
        description: fields.description.clone(),
        new_files: staged
            .iter()
            .map(|file| NewUpload {
                bytes: file.bytes.clone(),
                content_type: file.content_type.clone(),
                description: file.description.clone(),
            })
            .collect(),
        editor: config.editor().clone(),
    }
}

/// RAII guard for the single-commit invariant.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullEvents;
    use crate::memory::{GatewayCall, MemoryGateway};
    use crate::preview::MemoryPreviewStore;
    use claimstage_types::{ClaimId, EditorId};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    fn claim_id() -> ClaimId {
        ClaimId::new("c1").unwrap()
    }

    fn media_row(id: &str, description: &str) -> ClaimMedia {
        ClaimMedia {
            id: MediaId::new(id).unwrap(),
            storage_path: format!("claims/c1/{id}.jpg"),
            description: description.into(),
            uploaded_at: None,
            is_deleted: false,
        }
    }

    fn seeded_claim() -> Claim {
        Claim {
            id: claim_id(),
            policy_id: "p1".into(),
            customer_id: "u1".into(),
            status: "Pending".into(),
            fields: ClaimFields {
                date_of_incident: "2024-03-01".into(),
                incident_time: "10:00:00".into(),
                incident_location: "M4 westbound".into(),
                description: "rear bumper".into(),
            },
            created_at: None,
        }
    }

    struct Fixture {
        gateway: Arc<MemoryGateway>,
        previews: Arc<MemoryPreviewStore>,
        session: EditSession,
    }

    fn fixture_with_media(media: Vec<ClaimMedia>) -> Fixture {
        let gateway = Arc::new(MemoryGateway::new());
        let previews = Arc::new(MemoryPreviewStore::new());
        let claim = seeded_claim();
        gateway.insert_claim(claim.clone(), media.clone());

        let session = EditSession::new(
            Arc::clone(&gateway) as Arc<dyn ClaimGateway>,
            Arc::clone(&previews) as Arc<dyn PreviewStore>,
            Arc::new(NullEvents),
            SessionConfig::new(EditorId::new("1").unwrap()),
            claim,
            media,
        );

        Fixture {
            gateway,
            previews,
            session,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_media(vec![media_row("m1", "scratch"), media_row("m2", "dent")])
    }

    #[test]
    fn cancel_restores_pre_edit_state_exactly() {
        let fx = fixture();
        let before = fx.session.claim();

        fx.session.begin_edit();
        fx.session.set_field(ClaimField::IncidentLocation, "changed");
        fx.session.set_field(ClaimField::Description, "changed too");
        fx.session
            .toggle_delete_mark(&MediaId::new("m1").unwrap());
        fx.session.cancel();

        assert_eq!(fx.session.claim(), before);
        assert!(!fx.session.is_editing());
        assert!(fx.session.marked_for_delete().is_empty());
    }

    #[test]
    fn double_toggle_leaves_mark_unchanged() {
        let fx = fixture();
        fx.session.begin_edit();
        let m1 = MediaId::new("m1").unwrap();

        fx.session.toggle_delete_mark(&m1);
        fx.session.toggle_delete_mark(&m1);

        assert!(fx.session.marked_for_delete().is_empty());
    }

    #[test]
    fn toggle_for_unknown_id_is_a_no_op() {
        let fx = fixture();
        fx.session.begin_edit();

        fx.session
            .toggle_delete_mark(&MediaId::new("not-loaded").unwrap());

        assert!(fx.session.marked_for_delete().is_empty());
    }

    #[test]
    fn stage_then_unstage_releases_the_preview() {
        let fx = fixture();
        fx.session.begin_edit();

        let id = fx
            .session
            .stage_new_file(vec![1, 2, 3], "image/jpeg", "new photo")
            .unwrap();
        assert_eq!(fx.previews.live_count(), 1);

        fx.session.unstage_new_file(&id);
        assert!(fx.session.staged_uploads().is_empty());
        assert_eq!(fx.previews.live_count(), 0);

        // Redundant unstage is not an error and releases nothing twice.
        fx.session.unstage_new_file(&id);
        assert_eq!(fx.previews.live_count(), 0);
    }

    #[test]
    fn staging_outside_an_edit_leaks_nothing() {
        let fx = fixture();
        assert!(fx
            .session
            .stage_new_file(vec![1], "image/png", "ignored")
            .is_none());
        assert_eq!(fx.previews.live_count(), 0);
    }

    #[test]
    fn can_save_tracks_required_fields_not_media() {
        let fx = fixture();
        assert!(!fx.session.can_save()); // not editing

        fx.session.begin_edit();
        assert!(fx.session.can_save());

        fx.session.set_field(ClaimField::DateOfIncident, "  ");
        assert!(!fx.session.can_save());

        fx.session.set_field(ClaimField::DateOfIncident, "2024-03-02");
        fx.session
            .stage_new_file(vec![1], "image/jpeg", "irrelevant to the gate");
        assert!(fx.session.can_save());
    }

    #[tokio::test]
    async fn validation_blocked_commit_never_reaches_the_gateway() {
        let fx = fixture();
        fx.session.begin_edit();
        fx.session.set_field(ClaimField::IncidentLocation, "");
        fx.gateway.clear_calls();

        let err = fx.session.commit().await.unwrap_err();
        assert_eq!(err, CommitError::ValidationBlocked);
        assert!(fx.gateway.calls().is_empty());
        assert!(fx.session.is_editing());
    }

    #[tokio::test]
    async fn commit_without_an_edit_is_rejected() {
        let fx = fixture();
        let err = fx.session.commit().await.unwrap_err();
        assert_eq!(err, CommitError::NoActiveEdit);
    }

    #[tokio::test]
    async fn end_to_end_commit_sequences_delete_update_refetch() {
        let fx = fixture();
        fx.session.begin_edit();
        fx.session.toggle_delete_mark(&MediaId::new("m1").unwrap());
        fx.session
            .stage_new_file(vec![0xAB; 16], "image/jpeg", "new damage photo");
        fx.session
            .set_field(ClaimField::IncidentLocation, "A40 junction 3");
        fx.gateway.clear_calls();

        let (claim, media) = fx.session.commit().await.unwrap();

        assert_eq!(
            fx.gateway.calls(),
            vec![
                GatewayCall::Delete(MediaId::new("m1").unwrap()),
                GatewayCall::Update(claim_id()),
                GatewayCall::Fetch(claim_id()),
            ]
        );

        // One surviving original plus one backend-assigned new row.
        assert_eq!(media.len(), 2);
        assert!(media.iter().any(|m| m.id.as_str() == "m2"));
        assert!(media.iter().any(|m| m.id.as_str() == "srv-1"));
        assert_eq!(claim.fields.incident_location, "A40 junction 3");

        // No staged state remains.
        assert!(!fx.session.is_editing());
        assert!(fx.session.staged_uploads().is_empty());
        assert_eq!(fx.previews.live_count(), 0);
        assert_eq!(fx.session.media(), media);
    }

    #[tokio::test]
    async fn empty_pending_edit_still_issues_the_update() {
        let fx = fixture();
        fx.session.begin_edit();
        fx.gateway.clear_calls();

        fx.session.commit().await.unwrap();

        assert_eq!(
            fx.gateway.calls(),
            vec![GatewayCall::Update(claim_id()), GatewayCall::Fetch(claim_id())]
        );
    }

    #[tokio::test]
    async fn partial_deletion_failure_names_failures_and_retry_skips_successes() {
        let fx = fixture_with_media(vec![
            media_row("m1", "a"),
            media_row("m2", "b"),
            media_row("m3", "c"),
        ]);
        let m1 = MediaId::new("m1").unwrap();
        let m2 = MediaId::new("m2").unwrap();
        let m3 = MediaId::new("m3").unwrap();

        fx.session.begin_edit();
        fx.session.toggle_delete_mark(&m1);
        fx.session.toggle_delete_mark(&m2);
        fx.session.toggle_delete_mark(&m3);
        fx.gateway.set_delete_failure(m2.clone(), true);

        let err = fx.session.commit().await.unwrap_err();
        match &err {
            CommitError::PartialDeletionFailure { failed, .. } => {
                assert_eq!(failed, &vec![m2.clone()]);
            }
            other => panic!("expected PartialDeletionFailure, got {other:?}"),
        }

        // Succeeded deletions stand; only the failed id remains pending.
        assert_eq!(fx.session.marked_for_delete(), vec![m2.clone()]);
        let remaining: Vec<String> = fx
            .session
            .media()
            .iter()
            .map(|m| m.id.to_string())
            .collect();
        assert_eq!(remaining, vec!["m2"]);

        // The update step was not attempted.
        assert!(!fx
            .gateway
            .calls()
            .iter()
            .any(|call| matches!(call, GatewayCall::Update(_))));

        // Retry attempts only the straggler, then proceeds.
        fx.gateway.set_delete_failure(m2.clone(), false);
        fx.gateway.clear_calls();
        fx.session.commit().await.unwrap();

        assert_eq!(
            fx.gateway.calls(),
            vec![
                GatewayCall::Delete(m2),
                GatewayCall::Update(claim_id()),
                GatewayCall::Fetch(claim_id()),
            ]
        );
    }

    #[tokio::test]
    async fn update_failure_preserves_pending_state() {
        let fx = fixture();
        fx.session.begin_edit();
        fx.session.set_field(ClaimField::Description, "kept for retry");
        fx.session
            .stage_new_file(vec![1, 2], "image/png", "kept too");
        fx.gateway.set_update_failure(true);

        let err = fx.session.commit().await.unwrap_err();
        assert!(matches!(err, CommitError::UpdateFailure { .. }));

        assert!(fx.session.is_editing());
        assert_eq!(fx.session.staged_uploads().len(), 1);
        assert_eq!(fx.previews.live_count(), 1);
        assert_eq!(
            fx.session.fields().unwrap().description,
            "kept for retry"
        );

        // No refetch after a failed update.
        assert!(!fx
            .gateway
            .calls()
            .iter()
            .any(|call| matches!(call, GatewayCall::Fetch(_))));

        // Retry succeeds once the backend recovers.
        fx.gateway.set_update_failure(false);
        fx.session.commit().await.unwrap();
        assert!(!fx.session.is_editing());
        assert_eq!(fx.previews.live_count(), 0);
    }

    #[tokio::test]
    async fn refresh_failure_clears_pending_state() {
        let fx = fixture();
        fx.session.begin_edit();
        fx.session.stage_new_file(vec![9], "image/jpeg", "uploaded");
        fx.gateway.set_fetch_failure(true);

        let err = fx.session.commit().await.unwrap_err();
        assert!(matches!(err, CommitError::RefreshFailure { .. }));

        // The write is durable: the edit must not be offered for retry.
        assert!(!fx.session.is_editing());
        assert_eq!(fx.previews.live_count(), 0);
    }

    #[tokio::test]
    async fn time_normalization_applies_at_the_payload_boundary() {
        let fx = fixture();

        fx.session.begin_edit();
        fx.session.set_field(ClaimField::IncidentTime, "14:30");
        fx.session.commit().await.unwrap();
        assert_eq!(fx.session.claim().fields.incident_time, "14:30:00");

        // A non-normalizable value is omitted: the stored time survives.
        fx.session.begin_edit();
        fx.session.set_field(ClaimField::IncidentTime, "2:30 PM");
        fx.session.commit().await.unwrap();
        assert_eq!(fx.session.claim().fields.incident_time, "14:30:00");
    }

    #[tokio::test]
    async fn status_is_never_transmitted() {
        // Structural: the payload type has no status field. Verify the
        // server-owned value survives a commit that changes everything else.
        let fx = fixture();
        fx.session.begin_edit();
        fx.session.set_field(ClaimField::IncidentLocation, "elsewhere");
        let (claim, _) = fx.session.commit().await.unwrap();
        assert_eq!(claim.status, "Pending");
    }

    #[tokio::test]
    async fn delete_media_now_removes_the_row_locally() {
        let fx = fixture();
        let m1 = MediaId::new("m1").unwrap();
        fx.session.begin_edit();
        fx.session.toggle_delete_mark(&m1);

        fx.session.delete_media_now(&m1).await.unwrap();

        assert!(fx.session.media().iter().all(|m| m.id != m1));
        assert!(fx.session.marked_for_delete().is_empty());
    }

    /// Gateway whose update call parks until released, to hold a commit in
    /// flight at a deterministic point.
    struct GatedGateway {
        inner: MemoryGateway,
        entered_update: Notify,
        release_update: Notify,
    }

    #[async_trait::async_trait]
    impl ClaimGateway for GatedGateway {
        async fn fetch_claim(
            &self,
            id: &ClaimId,
        ) -> Result<(Claim, Vec<ClaimMedia>), GatewayError> {
            self.inner.fetch_claim(id).await
        }

        async fn delete_media(&self, id: &MediaId) -> Result<(), GatewayError> {
            self.inner.delete_media(id).await
        }

        async fn update_claim(
            &self,
            id: &ClaimId,
            update: UpdateRequest,
        ) -> Result<(), GatewayError> {
            self.entered_update.notify_one();
            self.release_update.notified().await;
            self.inner.update_claim(id, update).await
        }
    }

    #[tokio::test]
    async fn concurrent_commit_is_rejected_without_network_calls() {
        let gateway = Arc::new(GatedGateway {
            inner: MemoryGateway::new(),
            entered_update: Notify::new(),
            release_update: Notify::new(),
        });
        let claim = seeded_claim();
        gateway.inner.insert_claim(claim.clone(), Vec::new());

        let session = Arc::new(EditSession::new(
            Arc::clone(&gateway) as Arc<dyn ClaimGateway>,
            Arc::new(MemoryPreviewStore::new()),
            Arc::new(NullEvents),
            SessionConfig::new(EditorId::new("1").unwrap()),
            claim,
            Vec::new(),
        ));
        session.begin_edit();

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.commit().await }
        });

        // Wait until the first commit is parked inside the update call.
        gateway.entered_update.notified().await;
        let calls_before = gateway.inner.calls().len();

        let err = session.commit().await.unwrap_err();
        assert_eq!(err, CommitError::CommitInFlight);
        assert_eq!(gateway.inner.calls().len(), calls_before);

        gateway.release_update.notify_one();
        first.await.unwrap().unwrap();
        assert!(!session.is_editing());
    }

    /// Observer that records event names in order.
    #[derive(Default)]
    struct RecordingEvents {
        log: StdMutex<Vec<String>>,
    }

    impl EditEvents for RecordingEvents {
        fn pending_changed(&self) {
            self.log.lock().unwrap().push("pending_changed".into());
        }
        fn commit_started(&self) {
            self.log.lock().unwrap().push("commit_started".into());
        }
        fn commit_succeeded(&self, _claim: &Claim, _media: &[ClaimMedia]) {
            self.log.lock().unwrap().push("commit_succeeded".into());
        }
        fn commit_failed(&self, error: &CommitError) {
            self.log
                .lock()
                .unwrap()
                .push(format!("commit_failed:{error:?}"));
        }
    }

    #[tokio::test]
    async fn events_mirror_the_commit_lifecycle() {
        let gateway = Arc::new(MemoryGateway::new());
        let events = Arc::new(RecordingEvents::default());
        let claim = seeded_claim();
        gateway.insert_claim(claim.clone(), Vec::new());

        let session = EditSession::new(
            Arc::clone(&gateway) as Arc<dyn ClaimGateway>,
            Arc::new(MemoryPreviewStore::new()),
            Arc::clone(&events) as Arc<dyn EditEvents>,
            SessionConfig::new(EditorId::new("1").unwrap()),
            claim,
            Vec::new(),
        );

        session.begin_edit();
        session.set_field(ClaimField::Description, "x");
        session.commit().await.unwrap();

        let log = events.log.lock().unwrap().clone();
        let log: Vec<&str> = log.iter().map(String::as_str).collect();
        assert_eq!(
            log,
            vec![
                "pending_changed",
                "pending_changed",
                "commit_started",
                "commit_succeeded"
            ]
        );
    }
}
