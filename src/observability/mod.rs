//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every service produces:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms via the metrics facade)
//!     → spans.rs (per-action spans carrying an action_id)
//!
//! Consumers:
//!     → stderr (fmt layer, EnvFilter)
//!     → any metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Logs are supplementary; failures always reach the caller as errors
//! - Metrics are no-ops until a recorder is installed
//! - Never log session tokens or signed transaction bytes

pub mod logging;
pub mod metrics;
pub mod spans;
