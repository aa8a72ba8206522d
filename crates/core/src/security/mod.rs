//! SQL security validation.
//!
//! Three independently composable checks over generated SQL text:
//!
//! - Injection signature detection ([`injection`])
//! - Read-only enforcement ([`readonly`])
//! - Structural sanity checks ([`structure`])
//!
//! [`validate_query`] runs all three and unions their findings. A query is
//! safe exactly when no stage produced an error; warnings are surfaced to
//! the caller but never block execution.

pub mod injection;
pub mod readonly;
pub mod structure;

pub use injection::detect_injection;
pub use readonly::{enforce_read_only, first_statement};
pub use structure::check_structure;

use serde::{Deserialize, Serialize};

/// Outcome of one validation stage, or of the combined validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityReport {
    /// True when no stage produced an error.
    pub safe: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SecurityReport {
    /// Build a report from collected findings; `safe` is derived.
    pub fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self { safe: errors.is_empty(), errors, warnings }
    }

    /// Fold another stage's findings into this report.
    pub fn merge(&mut self, other: SecurityReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.safe = self.errors.is_empty();
    }
}

/// Run every validation stage against `sql` and union the results.
pub fn validate_query(sql: &str) -> SecurityReport {
    let mut report = detect_injection(sql);
    report.merge(enforce_read_only(sql));
    report.merge(check_structure(sql));
    report
}
