//! Tabular anonymization engine.
//!
//! Tables flow through a configured technique: generalization, suppression,
//! pseudonymization, swapping and noise transform attributes, and evaluate
//! stages check k-anonymity, l-diversity or t-closeness over the
//! quasi-identifier equivalence classes.

pub mod cli;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod grouping;
pub mod inference;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod privacy;
pub mod readers;
pub mod stats;
pub mod table;
pub mod types;

pub use config::AnonymizationConfig;
pub use error::Error;
pub use evaluation::{Enforcement, PrivacyModel, PrivacyVerdict};
pub use pipeline::{run, PipelineOutcome, Stage, Technique};
pub use table::{Column, Record, Table};
pub use types::{AttributeRole, ColumnType, Result, Value};
