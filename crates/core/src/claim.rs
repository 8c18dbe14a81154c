//! Domain model for claims and their media.
//!
//! A [`Claim`] is the parent record shown in a detail view; [`ClaimMedia`] is
//! a file-backed child owned by exactly one claim. The editable scalar subset
//! of a claim lives in [`ClaimFields`], which deliberately has no status
//! field: status is server-owned, so it can never leak into an outbound
//! update payload by construction.

use chrono::{DateTime, Utc};
use claimstage_types::{ClaimId, MediaId};
use serde::{Deserialize, Serialize};

/// A claim record as last fetched from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Backend-assigned identifier.
    pub id: ClaimId,

    /// Policy the claim was raised against.
    pub policy_id: String,

    /// Customer who raised the claim.
    pub customer_id: String,

    /// Server-owned processing status. Read-only; never transmitted back.
    pub status: String,

    /// The user-editable scalar fields.
    pub fields: ClaimFields,

    /// When the claim was created, if the backend reported it.
    pub created_at: Option<DateTime<Utc>>,
}

/// The editable scalar fields of a claim.
///
/// Field values are held as the raw form text. Normalization (for example
/// widening a time to `HH:MM:SS`) happens once, when the outbound payload is
/// built, not while the user is typing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimFields {
    /// Incident date in the backend's `YYYY-MM-DD` form. May be empty while
    /// the form is being edited.
    pub date_of_incident: String,

    /// Incident time as typed. May be partial; normalized lazily at save.
    pub incident_time: String,

    /// Free-text location of the incident.
    pub incident_location: String,

    /// Free-text description of the damage.
    pub description: String,
}

/// Names of the editable fields, used for field-level intents and for the
/// configured required-field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimField {
    DateOfIncident,
    IncidentTime,
    IncidentLocation,
    Description,
}

impl ClaimFields {
    /// Sets one field by name.
    pub fn set(&mut self, field: ClaimField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ClaimField::DateOfIncident => self.date_of_incident = value,
            ClaimField::IncidentTime => self.incident_time = value,
            ClaimField::IncidentLocation => self.incident_location = value,
            ClaimField::Description => self.description = value,
        }
    }

    /// Returns one field by name.
    pub fn get(&self, field: ClaimField) -> &str {
        match field {
            ClaimField::DateOfIncident => &self.date_of_incident,
            ClaimField::IncidentTime => &self.incident_time,
            ClaimField::IncidentLocation => &self.incident_location,
            ClaimField::Description => &self.description,
        }
    }

    /// True when every field in `required` holds a non-blank value.
    pub fn satisfies(&self, required: &[ClaimField]) -> bool {
        required
            .iter()
            .all(|field| !self.get(*field).trim().is_empty())
    }
}

/// A media record (damage photo) belonging to one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimMedia {
    /// Backend-assigned identifier.
    pub id: MediaId,

    /// Opaque storage reference. Resolved to a fetchable URL by
    /// [`crate::media_url::resolve_media_url`], never by the reconciler.
    pub storage_path: String,

    /// User-supplied description of the photo.
    pub description: String,

    /// When the file was uploaded, if the backend reported it.
    pub uploaded_at: Option<DateTime<Utc>>,

    /// Soft-delete flag. Fetches filter deleted rows out, so a loaded
    /// collection normally never contains one.
    pub is_deleted: bool,
}
