//! Per-action spans.

use tracing::Span;
use uuid::Uuid;

/// Span for one user-triggered action, tagged with a fresh `action_id`.
pub fn action_span(action: &'static str) -> Span {
    let action_id = Uuid::new_v4();
    tracing::info_span!("wallet_action", action, %action_id)
}
