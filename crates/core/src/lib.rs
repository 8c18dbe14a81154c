//! # Claimstage Core
//!
//! Staged edit reconciliation for one claim record and its media collection.
//!
//! A detail-view editor accumulates independent user intents (field edits,
//! photos marked for deletion, newly staged uploads) and commits them with a
//! single save. This crate owns that pending state and the commit sequencing:
//!
//! - [`EditSession`] holds the pending edit and turns a save into the ordered
//!   gateway calls the backend requires (deletions first, then one combined
//!   additions-only update, then a source-of-truth refetch).
//! - [`ClaimGateway`] abstracts the backend. [`MemoryGateway`] is the
//!   in-memory implementation used by tests and demos; the networked
//!   implementation lives in the `claimstage-http` crate.
//! - [`PreviewStore`] abstracts locally generated previews of staged uploads
//!   so the session can release them without leaking.
//!
//! **No transport concerns**: HTTP, multipart encoding, and URL construction
//! belong in `claimstage-http`. This crate never sees a raw transport error.

pub mod claim;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod loader;
pub mod media_url;
pub mod memory;
pub mod pending;
pub mod preview;
pub mod reconciler;

pub use claim::{Claim, ClaimField, ClaimFields, ClaimMedia};
pub use config::SessionConfig;
pub use error::{CommitError, CommitResult};
pub use events::{EditEvents, NullEvents};
pub use gateway::{ClaimGateway, GatewayError, NewUpload, UpdateRequest};
pub use loader::fetch_for_display;
pub use media_url::resolve_media_url;
pub use memory::MemoryGateway;
pub use pending::{PendingEdit, StagedFile};
pub use preview::{MemoryPreviewStore, PreviewRef, PreviewStore};
pub use reconciler::{EditSession, StagedUpload};
