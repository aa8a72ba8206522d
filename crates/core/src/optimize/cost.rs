//! Heuristic cost estimation.
//!
//! A text-pattern score, not a query-plan cost model: fixed weights per
//! construct, summed, then bucketed. The weights are not calibrated against
//! any real planner and should not be read as one.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Score below which a query is considered cheap.
const LOW_THRESHOLD: u32 = 20;

/// Score below which a query is considered moderate.
const MEDIUM_THRESHOLD: u32 = 50;

static JOIN_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bjoin\b").unwrap());
static SUBQUERY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\(\s*select\b").unwrap());
static AGGREGATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\b(count|sum|avg|min|max)\s*\()|(\bgroup\s+by\b)").unwrap());
static DISTINCT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bdistinct\b").unwrap());
static ORDER_BY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\border\s+by\b").unwrap());
static LIKE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\blike\b").unwrap());

/// Heuristic cost classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CostBucket {
    Low,
    Medium,
    High,
}

/// Additive pattern score for `sql`.
pub fn cost_score(sql: &str) -> u32 {
    let mut score = 0;

    score += 10 * JOIN_KEYWORD.find_iter(sql).count() as u32;
    score += 15 * SUBQUERY.find_iter(sql).count() as u32;
    score += 5 * AGGREGATION.find_iter(sql).count() as u32;

    if DISTINCT.is_match(sql) {
        score += 10;
    }
    if ORDER_BY.is_match(sql) {
        score += 5;
    }

    score += 8 * LIKE_KEYWORD.find_iter(sql).count() as u32;

    score
}

/// Bucket the score: `< 20` low, `< 50` medium, otherwise high.
pub fn estimate_cost(sql: &str) -> CostBucket {
    let score = cost_score(sql);
    if score < LOW_THRESHOLD {
        CostBucket::Low
    } else if score < MEDIUM_THRESHOLD {
        CostBucket::Medium
    } else {
        CostBucket::High
    }
}
