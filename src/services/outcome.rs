use serde::Serialize;
use std::fmt::Display;
use tracing::warn;

/// Result of a best-effort step that runs after a committed state change.
/// Failures are reported, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum SideEffect {
    Applied,
    Skipped,
    Failed(String),
}

impl SideEffect {
    /// Folds a step result into an outcome, logging failures under `step`.
    pub fn attempt<T, E: Display>(step: &str, result: Result<T, E>) -> Self {
        match result {
            Ok(_) => SideEffect::Applied,
            Err(e) => {
                warn!(step, error = %e, "best-effort step failed");
                SideEffect::Failed(e.to_string())
            }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, SideEffect::Applied)
    }
}
