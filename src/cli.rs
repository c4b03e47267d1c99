use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::error::Error;
use crate::evaluation::{Enforcement, PrivacyModel};
use crate::pipeline::{Stage, Technique};
use crate::types::Result;

/// Anonymize tabular records and check k-anonymity, l-diversity and
/// t-closeness
#[derive(Parser, Debug)]
#[command(name = "tabular-anon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a configured anonymization technique to a table
    Run {
        /// Input CSV/TSV file path
        #[arg(short, long)]
        input: PathBuf,

        /// JSON configuration (roles and technique)
        #[arg(short, long)]
        config: PathBuf,

        /// Output CSV file path (stdout if not specified)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// JSON run report path
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Pseudonym mapping file (defaults to <input>.recode.txt)
        #[arg(long)]
        recode_out: Option<PathBuf>,

        /// Increase log verbosity (-v, -vv, -vvv)
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,

        /// Only log errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Evaluate privacy models on a table without transforming it
    Check {
        /// Input CSV/TSV file path
        #[arg(short, long)]
        input: PathBuf,

        /// Quasi-identifier attributes, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        quasi: Vec<String>,

        /// Sensitive attribute (needed for --l and --t)
        #[arg(short, long)]
        sensitive: Option<String>,

        /// Minimum equivalence class size
        #[arg(short, long)]
        k: Option<usize>,

        /// Minimum distinct sensitive values per class
        #[arg(short, long)]
        l: Option<usize>,

        /// Maximum distance from the global sensitive distribution
        #[arg(short, long)]
        t: Option<f64>,

        /// Increase log verbosity (-v, -vv, -vvv)
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,

        /// Only log errors
        #[arg(short, long)]
        quiet: bool,
    },
}

/// Build a report-only technique evaluating each requested model
pub fn check_technique(
    quasi: &[String],
    sensitive: Option<&str>,
    k: Option<usize>,
    l: Option<usize>,
    t: Option<f64>,
) -> Result<Technique> {
    let quasi: Vec<String> = quasi
        .iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();
    if quasi.is_empty() {
        return Err(Error::configuration("--quasi needs at least one attribute"));
    }

    let models: Vec<PrivacyModel> = [
        k.map(|k| PrivacyModel::KAnonymity { k }),
        l.map(|l| PrivacyModel::LDiversity { l }),
        t.map(|t| PrivacyModel::TCloseness { t }),
    ]
    .into_iter()
    .flatten()
    .collect();
    if models.is_empty() {
        return Err(Error::configuration("give at least one of --k, --l, --t"));
    }

    let stages = models
        .into_iter()
        .map(|model| {
            if model.needs_sensitive_attribute() && sensitive.is_none() {
                return Err(Error::configuration(format!(
                    "{} requires --sensitive",
                    model
                )));
            }
            Ok(Stage::Evaluate {
                model,
                quasi_identifiers: Some(quasi.clone()),
                sensitive: sensitive.map(str::to_string),
                enforcement: Enforcement::Report,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let technique = Technique::new("check", stages);
    technique.validate()?;
    Ok(technique)
}
