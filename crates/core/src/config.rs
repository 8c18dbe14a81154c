//! Edit-session configuration.
//!
//! Configuration is resolved once at startup and passed into the session,
//! rather than read from process-wide state during editing. This keeps
//! behaviour consistent across test harnesses and lets two sessions run with
//! different editors or validation rules in the same process.

use crate::claim::ClaimField;
use claimstage_types::EditorId;

/// Fields that must be non-blank before a save is offered, unless the caller
/// configures otherwise.
pub const DEFAULT_REQUIRED_FIELDS: &[ClaimField] =
    &[ClaimField::DateOfIncident, ClaimField::IncidentLocation];

/// Configuration for one [`crate::EditSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    editor: EditorId,
    required_fields: Vec<ClaimField>,
}

impl SessionConfig {
    /// Creates a configuration with the default required-field list.
    pub fn new(editor: EditorId) -> Self {
        Self {
            editor,
            required_fields: DEFAULT_REQUIRED_FIELDS.to_vec(),
        }
    }

    /// Replaces the required-field list.
    ///
    /// An empty list is allowed and means every edit is saveable.
    #[must_use]
    pub fn with_required_fields(mut self, required_fields: Vec<ClaimField>) -> Self {
        self.required_fields = required_fields;
        self
    }

    /// The identifier sent as the editing user on every combined update.
    pub fn editor(&self) -> &EditorId {
        &self.editor
    }

    /// The fields that gate the save action.
    pub fn required_fields(&self) -> &[ClaimField] {
        &self.required_fields
    }
}
