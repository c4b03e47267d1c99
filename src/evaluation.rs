//! Privacy model evaluation over equivalence classes.
//!
//! Each model decides per class whether it is satisfied; the table-level
//! verdict is `Satisfied` only when every class is. What happens to the
//! records of failing classes is an explicit [`Enforcement`] policy.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::grouping::EquivalenceClass;
use crate::table::Table;
use crate::types::{Result, Value};

/// A privacy model with its parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrivacyModel {
    /// Every class has at least `k` records
    KAnonymity { k: usize },
    /// Every class has at least `l` distinct sensitive values
    LDiversity { l: usize },
    /// Every class's sensitive distribution is within `t` of the global one
    TCloseness { t: f64 },
}

impl PrivacyModel {
    /// Parameter checks, run before any evaluation
    pub fn validate(&self) -> Result<()> {
        match *self {
            PrivacyModel::KAnonymity { k } if k < 1 => {
                Err(Error::configuration(format!("k must be at least 1, got {}", k)))
            }
            PrivacyModel::LDiversity { l } if l < 1 => {
                Err(Error::configuration(format!("l must be at least 1, got {}", l)))
            }
            PrivacyModel::TCloseness { t } if !t.is_finite() || t < 0.0 => Err(
                Error::configuration(format!("t must be a finite number >= 0, got {}", t)),
            ),
            _ => Ok(()),
        }
    }

    pub fn needs_sensitive_attribute(&self) -> bool {
        !matches!(self, PrivacyModel::KAnonymity { .. })
    }
}

impl fmt::Display for PrivacyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivacyModel::KAnonymity { k } => write!(f, "{}-anonymity", k),
            PrivacyModel::LDiversity { l } => write!(f, "{}-diversity", l),
            PrivacyModel::TCloseness { t } => write!(f, "{}-closeness", t),
        }
    }
}

/// What to do with records of classes failing the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enforcement {
    /// Remove failing classes from the output table
    #[default]
    Drop,
    /// Fail the whole evaluation if any class fails
    Reject,
    /// Keep the table unchanged and only report the verdict
    Report,
}

/// Proportion of each sensitive value within a non-empty record set.
///
/// Counts are kept exact; a proportion or deviation is only turned into a
/// float by a single division at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    counts: BTreeMap<Value, u64>,
    total: u64,
}

impl Distribution {
    /// Distribution of `values`; `None` for an empty set
    pub fn of<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<Self> {
        let mut counts: BTreeMap<Value, u64> = BTreeMap::new();
        let mut total: u64 = 0;
        for value in values {
            *counts.entry(value.clone()).or_insert(0) += 1;
            total += 1;
        }
        if total == 0 {
            return None;
        }
        Some(Self { counts, total })
    }

    /// Distribution of one column over the whole table
    pub fn from_table(table: &Table, attribute: &str) -> Result<Option<Self>> {
        Ok(Self::of(table.column_values(attribute)?))
    }

    fn count(&self, value: &Value) -> u64 {
        self.counts.get(value).copied().unwrap_or(0)
    }

    /// Proportion of `value`, zero when absent
    pub fn proportion(&self, value: &Value) -> f64 {
        self.count(value) as f64 / self.total as f64
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.counts.keys()
    }

    /// `|c/n - C/N|` evaluated as `|c*N - C*n| / (n*N)` so the result is the
    /// correctly rounded exact deviation
    fn deviation(&self, global: &Distribution, value: &Value) -> f64 {
        let local = u128::from(self.count(value)) * u128::from(global.total);
        let overall = u128::from(global.count(value)) * u128::from(self.total);
        let denominator = u128::from(self.total) * u128::from(global.total);
        local.abs_diff(overall) as f64 / denominator as f64
    }

    /// Largest per-value absolute difference to `global`, over every value
    /// present in either distribution
    pub fn max_deviation(&self, global: &Distribution) -> f64 {
        global
            .values()
            .chain(self.values())
            .map(|v| self.deviation(global, v))
            .fold(0.0, f64::max)
    }
}

/// Table-level result of one model check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrivacyVerdict {
    Satisfied,
    Violated {
        reason: String,
        /// Keys of the failing classes
        offending: Vec<String>,
    },
}

impl PrivacyVerdict {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, PrivacyVerdict::Satisfied)
    }
}

/// Per-class evaluation detail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassOutcome {
    pub key: String,
    pub size: usize,
    /// Record count, distinct sensitive values, or max distribution distance
    pub measure: f64,
    pub satisfied: bool,
}

/// Output of [`evaluate`]
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub table: Table,
    pub verdict: PrivacyVerdict,
    pub outcomes: Vec<ClassOutcome>,
    pub dropped_records: usize,
}

fn ensure_non_empty(class: &EquivalenceClass) -> Result<()> {
    if class.is_empty() {
        return Err(Error::InternalConsistency(format!(
            "equivalence class {} has no records",
            class.label()
        )));
    }
    Ok(())
}

/// Sensitive values of a class; a row outside `table` means the class was
/// grouped from another table
fn sensitive_values<'a>(
    table: &'a Table,
    class: &EquivalenceClass,
    sensitive_index: usize,
) -> Result<Vec<&'a Value>> {
    class
        .rows
        .iter()
        .map(|&row| {
            table
                .records()
                .get(row)
                .and_then(|record| record.get(sensitive_index))
                .ok_or_else(|| {
                    Error::InternalConsistency(format!(
                        "class {} refers to row {} of a {}-record table",
                        class.label(),
                        row,
                        table.len()
                    ))
                })
        })
        .collect()
}

/// k-anonymity: a class passes iff it holds at least `k` records
pub fn k_anonymity(classes: &[EquivalenceClass], k: usize) -> Result<Vec<ClassOutcome>> {
    PrivacyModel::KAnonymity { k }.validate()?;
    classes
        .iter()
        .map(|class| {
            ensure_non_empty(class)?;
            Ok(ClassOutcome {
                key: class.label(),
                size: class.len(),
                measure: class.len() as f64,
                satisfied: class.len() >= k,
            })
        })
        .collect()
}

/// l-diversity: a class passes iff it holds at least `l` distinct values of
/// `sensitive`
pub fn l_diversity(
    table: &Table,
    classes: &[EquivalenceClass],
    l: usize,
    sensitive: &str,
) -> Result<Vec<ClassOutcome>> {
    PrivacyModel::LDiversity { l }.validate()?;
    let index = table.column_index(sensitive)?;
    classes
        .iter()
        .map(|class| {
            ensure_non_empty(class)?;
            let distinct: BTreeSet<&Value> =
                sensitive_values(table, class, index)?.into_iter().collect();
            Ok(ClassOutcome {
                key: class.label(),
                size: class.len(),
                measure: distinct.len() as f64,
                satisfied: distinct.len() >= l,
            })
        })
        .collect()
}

/// t-closeness: a class passes iff, for every sensitive value, the absolute
/// difference between its local and global proportion is `<= t`.
///
/// `global` must come from the table before any generalization.
pub fn t_closeness(
    table: &Table,
    classes: &[EquivalenceClass],
    t: f64,
    sensitive: &str,
    global: &Distribution,
) -> Result<Vec<ClassOutcome>> {
    PrivacyModel::TCloseness { t }.validate()?;
    let index = table.column_index(sensitive)?;
    classes
        .iter()
        .map(|class| {
            ensure_non_empty(class)?;
            let local = Distribution::of(sensitive_values(table, class, index)?).ok_or_else(|| {
                Error::InternalConsistency(format!("class {} has no distribution", class.label()))
            })?;
            let distance = local.max_deviation(global);
            Ok(ClassOutcome {
                key: class.label(),
                size: class.len(),
                measure: distance,
                satisfied: distance <= t,
            })
        })
        .collect()
}

/// Check `model` over `classes` of `table` and apply `enforcement`.
///
/// `sensitive` is required for l-diversity and t-closeness, `global` for
/// t-closeness on a non-empty table.
pub fn evaluate(
    table: &Table,
    classes: &[EquivalenceClass],
    model: &PrivacyModel,
    sensitive: Option<&str>,
    global: Option<&Distribution>,
    enforcement: Enforcement,
) -> Result<Evaluation> {
    model.validate()?;

    let require_sensitive = || {
        sensitive.ok_or_else(|| {
            Error::configuration(format!("{} requires a sensitive attribute", model))
        })
    };

    let outcomes = match *model {
        PrivacyModel::KAnonymity { k } => k_anonymity(classes, k)?,
        PrivacyModel::LDiversity { l } => l_diversity(table, classes, l, require_sensitive()?)?,
        PrivacyModel::TCloseness { t } => {
            let sensitive = require_sensitive()?;
            match global {
                Some(global) => t_closeness(table, classes, t, sensitive, global)?,
                None if classes.is_empty() => Vec::new(),
                None => {
                    return Err(Error::configuration(format!(
                        "{} requires a global distribution of '{}'",
                        model, sensitive
                    )))
                }
            }
        }
    };

    let offending: Vec<String> = outcomes
        .iter()
        .filter(|o| !o.satisfied)
        .map(|o| o.key.clone())
        .collect();

    let verdict = if offending.is_empty() {
        PrivacyVerdict::Satisfied
    } else {
        PrivacyVerdict::Violated {
            reason: format!(
                "{} of {} equivalence classes fail {}",
                offending.len(),
                outcomes.len(),
                model
            ),
            offending: offending.clone(),
        }
    };

    let (output, dropped_records) = match enforcement {
        Enforcement::Reject if !offending.is_empty() => {
            return Err(Error::PrivacyRejected {
                model: model.to_string(),
                offending,
            });
        }
        Enforcement::Drop if !offending.is_empty() => {
            let mut keep: Vec<usize> = classes
                .iter()
                .zip(&outcomes)
                .filter(|(_, o)| o.satisfied)
                .flat_map(|(c, _)| c.rows.iter().copied())
                .collect();
            keep.sort_unstable();
            let dropped = table.len() - keep.len();
            tracing::warn!(
                model = %model,
                classes = offending.len(),
                records = dropped,
                "dropped equivalence classes failing privacy model"
            );
            (table.select(&keep), dropped)
        }
        _ => (table.clone(), 0),
    };

    Ok(Evaluation {
        table: output,
        verdict,
        outcomes,
        dropped_records,
    })
}
