//! Process-wide log setup and per-invocation spans.

/// Install the JSON subscriber. Later calls are no-ops.
pub fn init() {
    tracing::init();
}

pub mod span;
pub mod tracing;

pub use span::{InvocationId, invocation_span};
