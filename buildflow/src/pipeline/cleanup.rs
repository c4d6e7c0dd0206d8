//! Reverse-order cleanup of the steps a build ran.

use crate::context::RunContext;
use crate::events::names;
use crate::steps::Step;
use std::sync::Arc;
use tracing::{debug, warn};

/// A cleanup action that reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CleanupFailure {
    pub(crate) index: usize,
    pub(crate) step: String,
    pub(crate) message: String,
}

/// Steps whose forward action ran, unwound in LIFO order.
#[derive(Default)]
pub(crate) struct CleanupStack {
    entries: Vec<(usize, Arc<dyn Step>)>,
}

impl CleanupStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, index: usize, step: Arc<dyn Step>) {
        self.entries.push((index, step));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Runs every cleanup action, last pushed first.
    ///
    /// A failing cleanup never stops the remaining ones.
    pub(crate) fn unwind(self, ctx: &mut RunContext) -> Vec<CleanupFailure> {
        let mut failures = Vec::new();

        for (index, step) in self.entries.into_iter().rev() {
            let description = step.description().to_string();
            let result = step.cleanup(ctx);

            if result.is_success() {
                debug!(step = %description, index, "Step cleaned up");
                ctx.emit_event(
                    names::STEP_CLEANUP,
                    Some(serde_json::json!({
                        "run_id": ctx.run_id(),
                        "step": description,
                        "index": index,
                    })),
                );
            } else {
                let message = result.message.unwrap_or_else(|| "cleanup failed".to_string());
                warn!(step = %description, index, error = %message, "Step cleanup failed");
                ctx.emit_event(
                    names::STEP_CLEANUP_FAILED,
                    Some(serde_json::json!({
                        "run_id": ctx.run_id(),
                        "step": description,
                        "index": index,
                        "error": message,
                    })),
                );
                failures.push(CleanupFailure {
                    index,
                    step: description,
                    message,
                });
            }
        }

        failures
    }
}

impl std::fmt::Debug for CleanupStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupStack")
            .field("pending_count", &self.len())
            .finish()
    }
}
