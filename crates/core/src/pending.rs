//! The pending edit: transient, in-memory, never persisted.
//!
//! A [`PendingEdit`] is created when the user enters edit mode, mutated by
//! every field- or media-level intent, and discarded on cancel or after a
//! successful save. It holds three things: a snapshot of the editable
//! fields, the set of media ids marked for deletion, and the ordered list of
//! staged uploads.
//!
//! Invariants enforced here:
//! - the delete set only ever contains ids the caller has verified against
//!   the loaded media collection (the session performs that check);
//! - staged identifiers are unique within the edit and can never collide
//!   with a persisted media id (guaranteed by [`StagedId`] generation).

use crate::claim::{ClaimField, ClaimFields};
use crate::preview::PreviewRef;
use claimstage_types::{MediaId, StagedId};
use std::collections::BTreeSet;

/// One staged (not yet persisted) upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Locally generated identifier, valid only within this pending edit.
    pub id: StagedId,

    /// Raw file bytes, held until the combined update transmits them.
    pub bytes: Vec<u8>,

    /// MIME type as reported by the file picker.
    pub content_type: String,

    /// User-supplied description, amendable until save.
    pub description: String,

    /// Preview reference owned by this entry; released when the entry goes.
    pub preview: PreviewRef,
}

/// Accumulated, not-yet-persisted changes to one claim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingEdit {
    fields: ClaimFields,
    delete_marks: BTreeSet<MediaId>,
    staged: Vec<StagedFile>,
}

impl PendingEdit {
    /// Creates a pending edit from a snapshot of the claim's editable fields.
    pub fn new(fields: ClaimFields) -> Self {
        Self {
            fields,
            delete_marks: BTreeSet::new(),
            staged: Vec::new(),
        }
    }

    /// The current field snapshot.
    pub fn fields(&self) -> &ClaimFields {
        &self.fields
    }

    /// Sets one field in the snapshot. No validation happens here; required
    /// fields are evaluated lazily by the save gate.
    pub fn set_field(&mut self, field: ClaimField, value: impl Into<String>) {
        self.fields.set(field, value);
    }

    /// Media ids currently marked for deletion, in stable order.
    pub fn delete_marks(&self) -> impl Iterator<Item = &MediaId> {
        self.delete_marks.iter()
    }

    /// True when the given id is marked for deletion.
    pub fn is_marked(&self, id: &MediaId) -> bool {
        self.delete_marks.contains(id)
    }

    /// Toggles the delete mark for an id. Returns `true` when the id is
    /// marked after the call. Toggling twice restores the original state.
    pub fn toggle_delete_mark(&mut self, id: MediaId) -> bool {
        if self.delete_marks.remove(&id) {
            false
        } else {
            self.delete_marks.insert(id);
            true
        }
    }

    /// Removes a delete mark, if present. Used after a deletion succeeded
    /// server-side so a retry does not re-attempt it.
    pub fn clear_delete_mark(&mut self, id: &MediaId) {
        self.delete_marks.remove(id);
    }

    /// Appends a staged upload.
    pub fn push_staged(&mut self, file: StagedFile) {
        debug_assert!(
            self.staged.iter().all(|existing| existing.id != file.id),
            "staged identifiers must be unique within a pending edit"
        );
        self.staged.push(file);
    }

    /// Removes a staged upload by id, returning it so the caller can release
    /// its preview. Returns `None` when the id is not present.
    pub fn remove_staged(&mut self, id: &StagedId) -> Option<StagedFile> {
        let index = self.staged.iter().position(|file| &file.id == id)?;
        Some(self.staged.remove(index))
    }

    /// Amends the description of a staged upload. No-op for an unknown id.
    pub fn set_staged_description(&mut self, id: &StagedId, description: impl Into<String>) {
        if let Some(file) = self.staged.iter_mut().find(|file| &file.id == id) {
            file.description = description.into();
        }
    }

    /// Staged uploads in staging order.
    pub fn staged(&self) -> &[StagedFile] {
        &self.staged
    }

    /// Takes every staged upload out of the edit, in order. Used on teardown
    /// so each preview can be released exactly once.
    pub fn drain_staged(&mut self) -> Vec<StagedFile> {
        std::mem::take(&mut self.staged)
    }
}
