//! cohortlens-core: Exam sheet parsing, roster merging, and cohort statistics.
//!
//! This crate defines the data model, the sheet parser, the roster that
//! joins students across sheets, the aggregation functions, and the traits
//! that sheet sources and narrative backends implement.

pub mod corpus;
pub mod error;
pub mod model;
pub mod narrative;
pub mod parser;
pub mod report;
pub mod roster;
pub mod source;
pub mod statistics;
pub mod store;
pub mod traits;
