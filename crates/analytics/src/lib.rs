//! Metrics aggregation and correlation: story-point completion from the
//! issue tracker, commit/PR activity from the source-control host, and the
//! derived indicators and insight cards that combine the two.

pub mod activity;
pub mod completion;
pub mod correlation;
pub mod models;

pub use activity::ActivityMetricsService;
pub use completion::CompletionAnalyticsService;
pub use correlation::CorrelationEngine;
