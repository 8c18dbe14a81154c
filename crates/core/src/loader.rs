//! Fetch-for-display with cooperative cancellation.
//!
//! When a detail view is torn down while its initial fetch is still in
//! flight, the response must never be applied to a newer view's state. The
//! caller threads a [`CancellationToken`] through the fetch; cancellation is
//! checked both while awaiting and again after the response arrives, since
//! the token may have been cancelled in the gap between the response
//! completing and this future being polled.
//!
//! This applies to display fetches only. A commit in flight is not
//! cancellable by navigation; the presentation layer prevents navigating
//! away while a save is outstanding.

use crate::claim::{Claim, ClaimMedia};
use crate::gateway::{ClaimGateway, GatewayError};
use claimstage_types::ClaimId;
use tokio_util::sync::CancellationToken;

/// Fetches a claim for display, honouring cancellation.
///
/// Returns `Ok(None)` when the token was cancelled (before, during, or
/// immediately after the fetch), meaning the result must not be rendered.
///
/// # Errors
///
/// Propagates the gateway error when the fetch itself failed and the token
/// is still live.
pub async fn fetch_for_display(
    gateway: &dyn ClaimGateway,
    id: &ClaimId,
    cancel: &CancellationToken,
) -> Result<Option<(Claim, Vec<ClaimMedia>)>, GatewayError> {
    if cancel.is_cancelled() {
        return Ok(None);
    }

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(claim = %id, "display fetch cancelled while in flight");
            Ok(None)
        }
        result = gateway.fetch_claim(id) => {
            if cancel.is_cancelled() {
                tracing::debug!(claim = %id, "display fetch completed after cancellation; dropping");
                return Ok(None);
            }
            result.map(Some)
        }
    }
}
