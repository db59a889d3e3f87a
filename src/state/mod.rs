//! Live aggregated state maintained by the pipeline.

pub mod aggregator;

pub use aggregator::{ActivityAggregator, DetectedApplication, DetectedTask, EMPTY_SUMMARY};
