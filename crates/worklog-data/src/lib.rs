//! Data pipeline for worklog.
//!
//! Responsible for decoding exported activity-log CSV files, classifying and
//! filtering their records, aggregating statistics, and deriving the report
//! views a display layer needs.

pub mod aggregator;
pub mod analysis;
pub mod encoding;
pub mod filter;
pub mod reader;
pub mod report;

pub use worklog_core as core;
