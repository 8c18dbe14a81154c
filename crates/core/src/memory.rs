//! In-memory gateway implementation.
//!
//! One reconciler, two gateways: this is the non-networked one, used by the
//! test suite and the CLI demo. It applies the same semantics the backend
//! does (soft deletion, additions-only updates, server-assigned media ids,
//! fetches that filter deleted rows) and additionally records every call
//! and supports scripted failures so the partial-failure commit paths can be
//! exercised deterministically.

use crate::claim::{Claim, ClaimMedia};
use crate::gateway::{ClaimGateway, GatewayError, UpdateRequest};
use chrono::Utc;
use claimstage_types::{ClaimId, MediaId};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A recorded gateway call, for assertions on call counts and ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Fetch(ClaimId),
    Delete(MediaId),
    Update(ClaimId),
}

#[derive(Debug, Default)]
struct Inner {
    claims: HashMap<ClaimId, (Claim, Vec<ClaimMedia>)>,
    calls: Vec<GatewayCall>,
    failing_deletes: HashSet<MediaId>,
    fail_updates: bool,
    fail_fetches: bool,
    next_media_id: u64,
}

/// In-memory [`ClaimGateway`].
#[derive(Debug, Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

impl MemoryGateway {
    /// Creates an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a claim and its media collection.
    pub fn insert_claim(&self, claim: Claim, media: Vec<ClaimMedia>) {
        let mut inner = self.lock();
        inner.claims.insert(claim.id.clone(), (claim, media));
    }

    /// Makes deletion of `id` fail until cleared again.
    pub fn set_delete_failure(&self, id: MediaId, failing: bool) {
        let mut inner = self.lock();
        if failing {
            inner.failing_deletes.insert(id);
        } else {
            inner.failing_deletes.remove(&id);
        }
    }

    /// Makes every update call fail until cleared again.
    pub fn set_update_failure(&self, failing: bool) {
        self.lock().fail_updates = failing;
    }

    /// Makes every fetch call fail until cleared again.
    pub fn set_fetch_failure(&self, failing: bool) {
        self.lock().fail_fetches = failing;
    }

    /// Returns every call made so far, in order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    /// Clears the recorded call log.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory gateway lock poisoned")
    }
}

#[async_trait::async_trait]
impl ClaimGateway for MemoryGateway {
    async fn fetch_claim(
        &self,
        id: &ClaimId,
    ) -> Result<(Claim, Vec<ClaimMedia>), GatewayError> {
        let mut inner = self.lock();
        inner.calls.push(GatewayCall::Fetch(id.clone()));

        if inner.fail_fetches {
            return Err(GatewayError::Transport("scripted fetch failure".into()));
        }

        let (claim, media) = inner.claims.get(id).ok_or_else(|| GatewayError::Rejected {
            status: 404,
            detail: format!("no claim with id {id}"),
        })?;

        let visible: Vec<ClaimMedia> = media
            .iter()
            .filter(|row| !row.is_deleted)
            .cloned()
            .collect();
        Ok((claim.clone(), visible))
    }

    async fn delete_media(&self, id: &MediaId) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        inner.calls.push(GatewayCall::Delete(id.clone()));

        if inner.failing_deletes.contains(id) {
            return Err(GatewayError::Rejected {
                status: 500,
                detail: format!("scripted delete failure for {id}"),
            });
        }

        for (_, media) in inner.claims.values_mut() {
            if let Some(row) = media.iter_mut().find(|row| &row.id == id) {
                row.is_deleted = true;
                return Ok(());
            }
        }

        Err(GatewayError::Rejected {
            status: 404,
            detail: format!("no media with id {id}"),
        })
    }

    async fn update_claim(
        &self,
        id: &ClaimId,
        update: UpdateRequest,
    ) -> Result<(), GatewayError> {
        let mut inner = self.lock();
        inner.calls.push(GatewayCall::Update(id.clone()));

        if inner.fail_updates {
            return Err(GatewayError::Rejected {
                status: 500,
                detail: "scripted update failure".into(),
            });
        }

        // Assign ids for new media before re-borrowing the claim entry.
        let assigned: Vec<MediaId> = update
            .new_files
            .iter()
            .map(|_| {
                inner.next_media_id += 1;
                MediaId::new(format!("srv-{}", inner.next_media_id))
                    .expect("generated media id is non-empty")
            })
            .collect();

        let (claim, media) = inner.claims.get_mut(id).ok_or_else(|| GatewayError::Rejected {
            status: 404,
            detail: format!("no claim with id {id}"),
        })?;

        if let Some(date) = update.date_of_incident {
            claim.fields.date_of_incident = date;
        }
        if let Some(time) = update.incident_time {
            claim.fields.incident_time = time.as_str().to_owned();
        }
        claim.fields.incident_location = update.incident_location;
        claim.fields.description = update.description;

        for (file, media_id) in update.new_files.into_iter().zip(assigned) {
            media.push(ClaimMedia {
                id: media_id,
                storage_path: format!("claims/{id}/{}.bin", media.len()),
                description: file.description,
                uploaded_at: Some(Utc::now()),
                is_deleted: false,
            });
        }

        Ok(())
    }
}
