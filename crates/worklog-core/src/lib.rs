//! Core types for the worklog analytics pipeline.
//!
//! Holds the record and aggregate data model, the activity classifier, filter
//! options, CLI settings and the shared error type. Nothing in this crate
//! performs I/O.

pub mod classifier;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
