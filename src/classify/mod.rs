//! Content classification: swappable rule tables plus a pure classifier.

pub mod classifier;
pub mod rules;

pub use classifier::{classify, AppMatch, Classification, TaskMatch};
pub use rules::{AppRule, Keyword, RuleSet, TaskRule, UiRule};
