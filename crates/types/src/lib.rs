//! Validated identifier and field types shared across the claimstage workspace.
//!
//! Claimstage reconciles staged edits to an insurance claim and its photo
//! collection against a remote backend. Identifiers for persisted records are
//! assigned by that backend and treated as opaque, while uploads that have not
//! been persisted yet need identifiers generated locally. Keeping both kinds
//! in one crate makes the "never collides" guarantee between them easy to
//! state and easy to test.
//!
//! This module provides:
//! - [`ClaimId`] / [`MediaId`]: opaque, non-empty, server-assigned identifiers.
//! - [`StagedId`]: a locally generated identifier for a not-yet-persisted
//!   upload. UUID-backed, so it cannot collide with any persisted identifier.
//! - [`EditorId`]: the fixed identifying field the backend requires on every
//!   combined update.
//! - [`IncidentTime`]: the canonical `HH:MM:SS` time-of-day form with the
//!   "don't guess" normalization policy for partially typed input.

mod ids;
mod time;

pub use ids::{ClaimId, EditorId, MediaId, StagedId};
pub use time::IncidentTime;

/// Error type for validated type construction.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The input was empty or contained only whitespace.
    #[error("identifier cannot be empty")]
    EmptyIdentifier,
}

/// Result type for validated type construction.
pub type TypesResult<T> = Result<T, TypesError>;
