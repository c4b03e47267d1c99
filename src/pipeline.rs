use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::evaluation::{evaluate, ClassOutcome, Distribution, Enforcement, PrivacyModel, PrivacyVerdict};
use crate::grouping::{group, quasi_identifiers_of};
use crate::privacy::{
    add_noise_with_summary, generalize, pseudonymize, suppress, swap_with_rng, GeneralizationRule,
    GeneralizeMode, NoiseMechanism, RecodeRegistry,
};
use crate::stats::NoiseSummary;
use crate::table::Table;
use crate::types::{AttributeRole, Result, DEFAULT_MASK, DEFAULT_PSEUDONYM_PREFIX};

fn default_mask() -> String {
    DEFAULT_MASK.to_string()
}

fn default_prefix() -> String {
    DEFAULT_PSEUDONYM_PREFIX.to_string()
}

/// One step of an anonymization technique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    /// Bucket `attribute` through `rule`; with `keep_original` the labels go
    /// to a new `output` column instead of replacing the raw one
    Generalize {
        attribute: String,
        rule: GeneralizationRule,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(default)]
        keep_original: bool,
    },
    Suppress {
        attribute: String,
        #[serde(default = "default_mask")]
        mask: String,
    },
    Pseudonymize {
        attribute: String,
        #[serde(default = "default_prefix")]
        prefix: String,
    },
    Swap {
        attribute: String,
        seed: u64,
    },
    Noise {
        attribute: String,
        epsilon: f64,
        sensitivity: f64,
        #[serde(default)]
        mechanism: NoiseMechanism,
        seed: u64,
    },
    /// Group and check a privacy model; without explicit attributes the
    /// table's role tags are used
    Evaluate {
        model: PrivacyModel,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quasi_identifiers: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sensitive: Option<String>,
        #[serde(default)]
        enforcement: Enforcement,
    },
}

impl Stage {
    /// Short name used in logs and reports, e.g. `generalize(PatientAge)`
    pub fn name(&self) -> String {
        match self {
            Stage::Generalize { attribute, .. } => format!("generalize({})", attribute),
            Stage::Suppress { attribute, .. } => format!("suppress({})", attribute),
            Stage::Pseudonymize { attribute, .. } => format!("pseudonymize({})", attribute),
            Stage::Swap { attribute, .. } => format!("swap({})", attribute),
            Stage::Noise { attribute, .. } => format!("noise({})", attribute),
            Stage::Evaluate { model, .. } => format!("evaluate({})", model),
        }
    }

    /// Parameter checks that need no table
    pub fn validate(&self) -> Result<()> {
        match self {
            Stage::Generalize {
                rule,
                output,
                keep_original,
                attribute,
            } => {
                rule.validate()?;
                if *keep_original && output.is_none() {
                    return Err(Error::configuration(format!(
                        "generalizing '{}' with keep_original needs an output column name",
                        attribute
                    )));
                }
                Ok(())
            }
            Stage::Noise {
                epsilon,
                sensitivity,
                mechanism,
                ..
            } => mechanism.validate(*epsilon, *sensitivity),
            Stage::Evaluate {
                model,
                quasi_identifiers,
                ..
            } => {
                model.validate()?;
                if quasi_identifiers.as_ref().is_some_and(|q| q.is_empty()) {
                    return Err(Error::configuration(
                        "quasi_identifiers, when given, must not be empty",
                    ));
                }
                Ok(())
            }
            Stage::Suppress { .. } | Stage::Pseudonymize { .. } | Stage::Swap { .. } => Ok(()),
        }
    }
}

/// A named, ordered sequence of stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    pub name: String,
    pub stages: Vec<Stage>,
}

impl Technique {
    pub fn new(name: &str, stages: Vec<Stage>) -> Self {
        Self {
            name: name.to_string(),
            stages,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::configuration("technique name must not be empty"));
        }
        for stage in &self.stages {
            stage.validate().map_err(|e| match e {
                Error::Configuration(msg) => {
                    Error::Configuration(format!("{}: {}", stage.name(), msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

/// Verdict of one evaluate stage
#[derive(Debug, Clone, Serialize)]
pub struct StageVerdict {
    pub stage: String,
    pub model: String,
    pub quasi_identifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<String>,
    pub verdict: PrivacyVerdict,
    pub dropped_records: usize,
    pub outcomes: Vec<ClassOutcome>,
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub technique: String,
    pub table: Table,
    pub verdicts: Vec<StageVerdict>,
    pub noise: Vec<NoiseSummary>,
    pub recodings: RecodeRegistry,
}

impl PipelineOutcome {
    /// True when every evaluate stage was satisfied
    pub fn all_satisfied(&self) -> bool {
        self.verdicts.iter().all(|v| v.verdict.is_satisfied())
    }
}

/// Run `technique` over `table`.
///
/// Every stage is validated before the first one executes. Stages then run
/// strictly in order, each consuming the previous output; the first failure
/// aborts the run and is returned as is.
pub fn run(table: &Table, technique: &Technique) -> Result<PipelineOutcome> {
    technique.validate()?;

    let span = tracing::info_span!("technique", name = %technique.name);
    let _guard = span.enter();

    let mut state = RunState::new(table);
    let mut current = table.clone();
    for stage in &technique.stages {
        current = match state.apply(stage, &current) {
            Ok(next) => next,
            Err(e) => {
                tracing::error!(stage = %stage.name(), error = %e, "stage failed, aborting run");
                return Err(e);
            }
        };
        tracing::info!(stage = %stage.name(), records = current.len(), "stage complete");
    }

    Ok(PipelineOutcome {
        technique: technique.name.clone(),
        table: current,
        verdicts: state.verdicts,
        noise: state.noise,
        recodings: state.recodings,
    })
}

struct RunState<'a> {
    /// Pipeline input; global distributions are taken from here
    input: &'a Table,
    globals: BTreeMap<String, Option<Distribution>>,
    verdicts: Vec<StageVerdict>,
    noise: Vec<NoiseSummary>,
    recodings: RecodeRegistry,
}

impl<'a> RunState<'a> {
    fn new(input: &'a Table) -> Self {
        Self {
            input,
            globals: BTreeMap::new(),
            verdicts: Vec::new(),
            noise: Vec::new(),
            recodings: RecodeRegistry::new(),
        }
    }

    fn apply(&mut self, stage: &Stage, table: &Table) -> Result<Table> {
        match stage {
            Stage::Generalize {
                attribute,
                rule,
                output,
                keep_original,
            } => {
                let mode = match (keep_original, output) {
                    (true, Some(output)) => GeneralizeMode::Derive {
                        output: output.clone(),
                    },
                    _ => GeneralizeMode::Replace {
                        output: output.clone(),
                    },
                };
                generalize(table, attribute, rule, &mode)
            }
            Stage::Suppress { attribute, mask } => suppress(table, attribute, mask),
            Stage::Pseudonymize { attribute, prefix } => {
                let (next, recoder) = pseudonymize(table, attribute, prefix)?;
                self.recodings.register(attribute, recoder);
                Ok(next)
            }
            Stage::Swap { attribute, seed } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                swap_with_rng(table, attribute, &mut rng)
            }
            Stage::Noise {
                attribute,
                epsilon,
                sensitivity,
                mechanism,
                seed,
            } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                let (next, summary) = add_noise_with_summary(
                    table,
                    attribute,
                    *epsilon,
                    *sensitivity,
                    mechanism,
                    &mut rng,
                )?;
                self.noise.push(summary);
                Ok(next)
            }
            Stage::Evaluate {
                model,
                quasi_identifiers,
                sensitive,
                enforcement,
            } => self.evaluate(
                stage,
                table,
                model,
                quasi_identifiers.as_deref(),
                sensitive.as_deref(),
                *enforcement,
            ),
        }
    }

    fn evaluate(
        &mut self,
        stage: &Stage,
        table: &Table,
        model: &PrivacyModel,
        quasi_identifiers: Option<&[String]>,
        sensitive: Option<&str>,
        enforcement: Enforcement,
    ) -> Result<Table> {
        let quasi_identifiers = match quasi_identifiers {
            Some(names) => names.to_vec(),
            None => quasi_identifiers_of(table),
        };
        if quasi_identifiers.is_empty() {
            return Err(Error::configuration(format!(
                "{}: no quasi-identifiers given or tagged",
                stage.name()
            )));
        }

        let sensitive = if model.needs_sensitive_attribute() {
            Some(resolve_sensitive(table, sensitive)?)
        } else {
            sensitive.map(str::to_string)
        };

        let global = match (model, &sensitive) {
            (PrivacyModel::TCloseness { .. }, Some(name)) => self.global_distribution(name)?,
            _ => None,
        };

        let classes = group(table, &quasi_identifiers)?;
        let evaluation = evaluate(
            table,
            &classes,
            model,
            sensitive.as_deref(),
            global.as_ref(),
            enforcement,
        )?;

        tracing::info!(
            model = %model,
            classes = classes.len(),
            satisfied = evaluation.verdict.is_satisfied(),
            "privacy model evaluated"
        );

        self.verdicts.push(StageVerdict {
            stage: stage.name(),
            model: model.to_string(),
            quasi_identifiers,
            sensitive,
            verdict: evaluation.verdict,
            dropped_records: evaluation.dropped_records,
            outcomes: evaluation.outcomes,
        });
        Ok(evaluation.table)
    }

    /// Distribution of `attribute` over the pipeline input, computed once
    fn global_distribution(&mut self, attribute: &str) -> Result<Option<Distribution>> {
        if let Some(cached) = self.globals.get(attribute) {
            return Ok(cached.clone());
        }
        let distribution = Distribution::from_table(self.input, attribute)?;
        self.globals.insert(attribute.to_string(), distribution.clone());
        Ok(distribution)
    }
}

/// Explicit name, or the single column tagged sensitive
fn resolve_sensitive(table: &Table, explicit: Option<&str>) -> Result<String> {
    if let Some(name) = explicit {
        table.column_index(name)?;
        return Ok(name.to_string());
    }
    let mut tagged = table.columns_with_role(AttributeRole::Sensitive);
    match tagged.len() {
        1 => Ok(tagged.remove(0)),
        0 => Err(Error::configuration("no sensitive attribute given or tagged")),
        n => Err(Error::configuration(format!(
            "{} attributes tagged sensitive ({}); name one explicitly",
            n,
            tagged.join(", ")
        ))),
    }
}
