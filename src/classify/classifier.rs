//! Pure content classification against a rule set.
//!
//! `classify` is deterministic for identical input and holds no state, so
//! it is safe to call concurrently from multiple analysis workers.

use crate::classify::rules::RuleSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A task category matched by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMatch {
    /// Task category name
    pub name: String,
    /// Match confidence in [0, 1]
    pub confidence: f64,
    /// Keywords that produced the match
    pub evidence: Vec<String>,
}

/// An application matched by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMatch {
    /// Canonical application name
    pub name: String,
    /// Match confidence in [0, 1]
    pub confidence: f64,
    /// Context gathered during the match (matched keywords, hints)
    pub context: BTreeMap<String, String>,
}

/// Classifier output: all task and application matches for one analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    pub tasks: Vec<TaskMatch>,
    pub applications: Vec<AppMatch>,
}

/// Classify extracted text plus detected UI-element labels.
///
/// Matching is case-insensitive. A category's confidence is the sum of its
/// matched keyword weights, capped at 1.0; the evidence list is the set of
/// keywords that matched.
pub fn classify(
    text: &str,
    ui_elements: &BTreeMap<String, Vec<String>>,
    rules: &RuleSet,
) -> Classification {
    let haystack = build_haystack(text, ui_elements);

    let mut tasks = Vec::new();
    for rule in &rules.tasks {
        let mut confidence = 0.0;
        let mut evidence = Vec::new();
        for keyword in &rule.keywords {
            if haystack.contains(&keyword.word.to_lowercase()) {
                confidence += keyword.weight;
                evidence.push(keyword.word.clone());
            }
        }
        if !evidence.is_empty() {
            tasks.push(TaskMatch {
                name: rule.name.clone(),
                confidence: confidence.min(1.0),
                evidence,
            });
        }
    }

    let mut applications = Vec::new();
    for rule in &rules.applications {
        let mut confidence = 0.0;
        let mut matched = Vec::new();
        for keyword in &rule.keywords {
            if haystack.contains(&keyword.word.to_lowercase()) {
                confidence += keyword.weight;
                matched.push(keyword.word.clone());
            }
        }
        if !matched.is_empty() {
            let mut context = BTreeMap::new();
            context.insert("keywords".to_string(), matched.join(","));
            applications.push(AppMatch {
                name: rule.name.clone(),
                confidence: confidence.min(1.0),
                context,
            });
        }
    }

    // Strongest matches first so the top entry is the primary guess.
    tasks.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    applications.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    Classification {
        tasks,
        applications,
    }
}

fn build_haystack(text: &str, ui_elements: &BTreeMap<String, Vec<String>>) -> String {
    let mut haystack = text.to_lowercase();
    for labels in ui_elements.values() {
        for label in labels {
            haystack.push(' ');
            haystack.push_str(&label.to_lowercase());
        }
    }
    haystack
}
