use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use strum::Display;

use super::categories::CategoryTable;
use super::matcher::{MatchPolicy, NormalizedMessage};
use crate::settings::settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Verdict {
    #[strum(serialize = "clean")]
    Clean,
    #[strum(serialize = "flagged")]
    Flagged,
}

/// Outcome of scoring one message.
///
/// `score` is the number of distinct trigger phrases found. A phrase that
/// occurs several times, or that is listed under several categories, counts
/// once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub score: u32,
    pub matched_categories: BTreeSet<String>,
    pub matched_keywords: BTreeSet<String>,
    /// Matched phrases grouped by category, for rendering and debugging.
    #[serde(skip)]
    pub category_hits: BTreeMap<String, BTreeSet<String>>,
}

impl AnalysisResult {
    pub fn is_clean(&self) -> bool {
        self.score == 0
    }

    /// A threshold of zero is treated as one so clean messages never flag.
    pub fn verdict(&self, threshold: u32) -> Verdict {
        if self.score >= threshold.max(1) {
            Verdict::Flagged
        } else {
            Verdict::Clean
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scorer {
    policy: MatchPolicy,
}

impl Scorer {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn from_settings() -> Self {
        Self::new(settings().scoring.policy)
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn analyze(&self, message: &str, table: &CategoryTable) -> AnalysisResult {
        let mut result = AnalysisResult::default();
        if table.is_empty() {
            return result;
        }

        let normalized = NormalizedMessage::new(message);
        let mut counted: HashSet<&str> = HashSet::new();

        for category in table.categories() {
            for phrase in category.phrases() {
                if !normalized.matches(phrase, self.policy) {
                    continue;
                }

                if counted.insert(phrase.folded()) {
                    result.matched_keywords.insert(phrase.text().to_string());
                }
                result
                    .category_hits
                    .entry(category.name().to_string())
                    .or_default()
                    .insert(phrase.text().to_string());
            }
        }

        result.score = counted.len() as u32;
        result.matched_categories = result.category_hits.keys().cloned().collect();

        if !result.is_clean() {
            tracing::debug!(
                score = result.score,
                policy = %self.policy,
                hits = ?result.category_hits,
                "message matched trigger phrases"
            );
        }

        result
    }
}

/// Scores `message` with the default substring policy.
pub fn analyze(message: &str, table: &CategoryTable) -> AnalysisResult {
    Scorer::default().analyze(message, table)
}
