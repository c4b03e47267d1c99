use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::table::{Column, Table};
use crate::types::{ColumnType, Result, Value};

/// A half-open numeric band `[lower, upper)`; a missing bound is unbounded.
///
/// Bands cover finite numbers only: NaN and infinities fall outside every
/// band and so are domain errors when generalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    pub label: String,
}

impl RangeBand {
    /// `(-inf, upper)`
    pub fn below(upper: f64, label: &str) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
            label: label.to_string(),
        }
    }

    /// `[lower, upper)`
    pub fn between(lower: f64, upper: f64, label: &str) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
            label: label.to_string(),
        }
    }

    /// `[lower, +inf)`
    pub fn at_least(lower: f64, label: &str) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
            label: label.to_string(),
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        x.is_finite() && x >= self.lower_bound() && x < self.upper_bound()
    }

    fn lower_bound(&self) -> f64 {
        self.lower.unwrap_or(f64::NEG_INFINITY)
    }

    fn upper_bound(&self) -> f64 {
        self.upper.unwrap_or(f64::INFINITY)
    }
}

/// Mapping from raw values to a finite set of category labels.
///
/// Rules never fall through to a default: a value outside every band (or
/// absent from the category map) is a domain error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneralizationRule {
    /// Disjoint numeric bands
    Ranges { bands: Vec<RangeBand> },
    /// Explicit value -> label table, keyed by the value's text form
    Categories { mapping: BTreeMap<String, String> },
}

impl GeneralizationRule {
    pub fn ranges(bands: Vec<RangeBand>) -> Self {
        GeneralizationRule::Ranges { bands }
    }

    pub fn categories<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        GeneralizationRule::Categories {
            mapping: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Check the rule is well formed: non-empty, labelled, bands ordered and
    /// pairwise disjoint.
    pub fn validate(&self) -> Result<()> {
        match self {
            GeneralizationRule::Ranges { bands } => {
                if bands.is_empty() {
                    return Err(Error::configuration("range rule has no bands"));
                }
                for band in bands {
                    if band.label.trim().is_empty() {
                        return Err(Error::configuration("range band with empty label"));
                    }
                    if band.lower.is_some_and(f64::is_nan) || band.upper.is_some_and(f64::is_nan) {
                        return Err(Error::configuration(format!(
                            "band '{}' has a NaN bound",
                            band.label
                        )));
                    }
                    if band.lower_bound() >= band.upper_bound() {
                        return Err(Error::configuration(format!(
                            "band '{}' is empty (lower >= upper)",
                            band.label
                        )));
                    }
                }

                let mut sorted: Vec<&RangeBand> = bands.iter().collect();
                sorted.sort_by(|a, b| a.lower_bound().total_cmp(&b.lower_bound()));
                for pair in sorted.windows(2) {
                    if pair[0].upper_bound() > pair[1].lower_bound() {
                        return Err(Error::configuration(format!(
                            "bands '{}' and '{}' overlap",
                            pair[0].label, pair[1].label
                        )));
                    }
                }
                Ok(())
            }
            GeneralizationRule::Categories { mapping } => {
                if mapping.is_empty() {
                    return Err(Error::configuration("category rule has no entries"));
                }
                if let Some((raw, _)) = mapping.iter().find(|(_, label)| label.trim().is_empty()) {
                    return Err(Error::configuration(format!(
                        "category '{}' maps to an empty label",
                        raw
                    )));
                }
                Ok(())
            }
        }
    }

    /// Label for a single value, or `None` when the rule does not cover it
    pub fn apply(&self, value: &Value) -> Option<&str> {
        if value.is_missing() {
            return None;
        }
        match self {
            GeneralizationRule::Ranges { bands } => {
                let x = value.as_f64()?;
                bands.iter().find(|b| b.contains(x)).map(|b| b.label.as_str())
            }
            GeneralizationRule::Categories { mapping } => {
                mapping.get(&value.to_string()).map(String::as_str)
            }
        }
    }
}

/// Whether the generalized values replace the source column or are added
/// beside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneralizeMode {
    /// Overwrite in place, optionally renaming the column (raw values are gone)
    Replace { output: Option<String> },
    /// Append a new derived column and keep the raw one
    Derive { output: String },
}

impl Default for GeneralizeMode {
    fn default() -> Self {
        GeneralizeMode::Replace { output: None }
    }
}

/// Generalize `attribute` through `rule`, returning a new table.
///
/// The generalized column is categorical and inherits the source column's
/// role.
pub fn generalize(
    table: &Table,
    attribute: &str,
    rule: &GeneralizationRule,
    mode: &GeneralizeMode,
) -> Result<Table> {
    let index = table.column_index(attribute)?;
    let source = &table.columns()[index];

    let labels = table
        .records()
        .iter()
        .map(|record| {
            let value = &record.values()[index];
            rule.apply(value)
                .map(Value::text)
                .ok_or_else(|| Error::domain(attribute, value, "has no generalization mapping"))
        })
        .collect::<Result<Vec<_>>>()?;

    let output_name = match mode {
        GeneralizeMode::Replace { output } => output.as_deref().unwrap_or(attribute),
        GeneralizeMode::Derive { output } => output.as_str(),
    };
    let column = Column::new(output_name, ColumnType::Categorical).with_role(source.role);

    tracing::debug!(attribute, output = output_name, records = table.len(), "generalized attribute");

    match mode {
        GeneralizeMode::Replace { .. } => table.with_column_replaced(index, column, labels),
        GeneralizeMode::Derive { .. } => table.with_column_appended(column, labels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::fixtures;
    use crate::types::AttributeRole;

    fn age_rule() -> GeneralizationRule {
        GeneralizationRule::ranges(vec![
            RangeBand::below(40.0, "<40"),
            RangeBand::between(40.0, 50.0, "40-49"),
            RangeBand::at_least(50.0, "50+"),
        ])
    }

    fn count_label(table: &Table, column: &str, label: &str) -> usize {
        table
            .column_values(column)
            .unwrap()
            .into_iter()
            .filter(|v| **v == Value::text(label))
            .count()
    }

    #[test]
    fn test_band_boundaries() {
        let rule = age_rule();
        assert_eq!(rule.apply(&Value::Integer(39)), Some("<40"));
        assert_eq!(rule.apply(&Value::Integer(40)), Some("40-49"));
        assert_eq!(rule.apply(&Value::Integer(49)), Some("40-49"));
        assert_eq!(rule.apply(&Value::Float(49.9)), Some("40-49"));
        assert_eq!(rule.apply(&Value::Integer(50)), Some("50+"));
        assert_eq!(rule.apply(&Value::text("-3")), Some("<40"));
    }

    #[test]
    fn test_patient_age_scenario() {
        let table = fixtures::patients();
        let mode = GeneralizeMode::Replace {
            output: Some("AgeGroup".to_string()),
        };
        let out = generalize(&table, "PatientAge", &age_rule(), &mode).unwrap();

        assert!(!out.has_column("PatientAge"));
        assert_eq!(count_label(&out, "AgeGroup", "<40"), 5);
        assert_eq!(count_label(&out, "AgeGroup", "40-49"), 3);
        assert_eq!(count_label(&out, "AgeGroup", "50+"), 2);

        let column = out.column("AgeGroup").unwrap();
        assert_eq!(column.column_type, ColumnType::Categorical);
        assert_eq!(column.role, AttributeRole::QuasiIdentifier);
        // position preserved
        assert_eq!(out.column_index("AgeGroup").unwrap(), 1);
        // input untouched
        assert_eq!(table.column_values("PatientAge").unwrap()[0], &Value::Integer(34));
    }

    #[test]
    fn test_derive_keeps_raw_column() {
        let table = fixtures::patients();
        let mode = GeneralizeMode::Derive {
            output: "AgeGroup".to_string(),
        };
        let out = generalize(&table, "PatientAge", &age_rule(), &mode).unwrap();

        assert_eq!(
            out.column_names(),
            vec!["PatientID", "PatientAge", "Gender", "Diagnosis", "AgeGroup"]
        );
        assert_eq!(out.column_values("PatientAge").unwrap()[3], &Value::Integer(50));
        assert_eq!(out.column_values("AgeGroup").unwrap()[3], &Value::text("50+"));
    }

    #[test]
    fn test_unmapped_value_is_domain_error() {
        let table = fixtures::patients();
        let rule = GeneralizationRule::ranges(vec![RangeBand::between(0.0, 50.0, "young")]);
        let result = generalize(&table, "PatientAge", &rule, &GeneralizeMode::default());
        assert!(matches!(
            result,
            Err(Error::Domain { attribute, value, .. }) if attribute == "PatientAge" && value == "50"
        ));
    }

    #[test]
    fn test_missing_value_is_domain_error() {
        let rule = age_rule();
        assert_eq!(rule.apply(&Value::Missing), None);
        assert_eq!(rule.apply(&Value::text("unknown")), None);
    }

    #[test]
    fn test_non_finite_values_match_no_band() {
        let rule = GeneralizationRule::ranges(vec![
            RangeBand::below(0.0, "negative"),
            RangeBand::at_least(0.0, "non-negative"),
        ]);
        assert_eq!(rule.apply(&Value::Float(1e300)), Some("non-negative"));
        assert_eq!(rule.apply(&Value::Float(f64::INFINITY)), None);
        assert_eq!(rule.apply(&Value::Float(f64::NEG_INFINITY)), None);
        assert_eq!(rule.apply(&Value::text("NaN")), None);
        assert!(!RangeBand::at_least(0.0, "x").contains(f64::INFINITY));

        let table = Table::from_rows(
            vec![Column::new("Score", ColumnType::Numeric)],
            vec![vec![Value::Float(f64::INFINITY)]],
        )
        .unwrap();
        let result = generalize(&table, "Score", &rule, &GeneralizeMode::default());
        assert!(matches!(result, Err(Error::Domain { .. })));
    }

    #[test]
    fn test_categories() {
        let table = fixtures::patients();
        let rule = GeneralizationRule::categories([("M", "Person"), ("F", "Person")]);
        let out = generalize(&table, "Gender", &rule, &GeneralizeMode::default()).unwrap();
        assert_eq!(count_label(&out, "Gender", "Person"), 10);
    }

    #[test]
    fn test_missing_attribute_is_schema_error() {
        let table = fixtures::patients();
        let result = generalize(&table, "Zip", &age_rule(), &GeneralizeMode::default());
        assert!(matches!(result, Err(Error::Schema { .. })));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let rule = GeneralizationRule::ranges(vec![
            RangeBand::below(45.0, "young"),
            RangeBand::at_least(40.0, "old"),
        ]);
        assert!(matches!(rule.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_empty_band_and_label() {
        let inverted = GeneralizationRule::ranges(vec![RangeBand::between(50.0, 40.0, "x")]);
        assert!(inverted.validate().is_err());

        let unlabelled = GeneralizationRule::ranges(vec![RangeBand::below(40.0, " ")]);
        assert!(unlabelled.validate().is_err());

        let empty = GeneralizationRule::ranges(vec![]);
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_adjacent_bands() {
        assert!(age_rule().validate().is_ok());
    }

    #[test]
    fn test_rule_from_json() {
        let json = r#"{"kind":"ranges","bands":[{"upper":40,"label":"<40"},{"lower":40,"label":"40+"}]}"#;
        let rule: GeneralizationRule = serde_json::from_str(json).unwrap();
        assert!(rule.validate().is_ok());
        assert_eq!(rule.apply(&Value::Integer(40)), Some("40+"));
    }
}
