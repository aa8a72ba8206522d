//! Injection signature detection.
//!
//! A flat, data-driven list of regex signatures, each with a severity.
//! Error-severity matches make the query unsafe; warning-severity matches
//! are surfaced but do not block execution. Rules are compiled once on
//! first use.

use std::sync::LazyLock;

use regex::Regex;

use super::SecurityReport;

/// How a matched rule affects the validation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One injection signature.
#[derive(Debug)]
pub struct SecurityRule {
    pub name: &'static str,
    pub severity: Severity,
    pub message: &'static str,
    regex: Regex,
}

impl SecurityRule {
    fn new(name: &'static str, severity: Severity, message: &'static str, pattern: &str) -> Self {
        Self { name, severity, message, regex: Regex::new(pattern).unwrap() }
    }
}

/// The signature list, ordered roughly by severity of what they catch.
static RULES: LazyLock<Vec<SecurityRule>> = LazyLock::new(|| {
    vec![
        SecurityRule::new(
            "command-execution",
            Severity::Error,
            "command execution attempt",
            r"(?i)\b(xp_cmdshell|exec\s+master)",
        ),
        SecurityRule::new(
            "file-access",
            Severity::Error,
            "file or disk operator",
            r"(?i)\b(bulk\s+insert|openrowset|pg_read_file|lo_import|lo_export)\b",
        ),
        SecurityRule::new(
            "stacked-statement",
            Severity::Error,
            "stacked mutating statement",
            r"(?i);\s*(insert|update|delete|drop|create|alter|truncate|grant|revoke)\b",
        ),
        SecurityRule::new(
            "comment-smuggling",
            Severity::Error,
            "SQL keyword hidden behind a comment",
            r"(?is)(--|/\*).*\b(select|insert|update|delete|drop)\b",
        ),
        SecurityRule::new(
            "union-select",
            Severity::Error,
            "UNION-based injection",
            r"(?i)\bunion\s+(all\s+)?select\b",
        ),
        SecurityRule::new(
            "boolean-blind",
            Severity::Error,
            "boolean-based blind injection",
            r"(?i)('\s*or\s*'[^']*'\s*=\s*')|(\bor\s+\d+\s*=\s*\d+)",
        ),
        SecurityRule::new(
            "time-blind",
            Severity::Error,
            "time-based blind injection",
            r"(?i)(pg_sleep|waitfor\s+delay|\bsleep\s*\(|benchmark\s*\()",
        ),
        SecurityRule::new(
            "system-catalog",
            Severity::Warning,
            "system catalog access",
            r"(?i)\b(information_schema|pg_catalog)\b",
        ),
        SecurityRule::new(
            "string-concatenation",
            Severity::Warning,
            "string concatenation operator",
            r"\|\|",
        ),
        SecurityRule::new(
            "char-construction",
            Severity::Warning,
            "CHAR/CONCAT string construction",
            r"(?i)\b(char|concat)\s*\(",
        ),
    ]
});

/// Test `sql` against every signature and collect the matches.
pub fn detect_injection(sql: &str) -> SecurityReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for rule in RULES.iter() {
        if rule.regex.is_match(sql) {
            let finding = format!("{}: {}", rule.name, rule.message);
            match rule.severity {
                Severity::Error => errors.push(finding),
                Severity::Warning => warnings.push(finding),
            }
        }
    }

    SecurityReport::from_findings(errors, warnings)
}
