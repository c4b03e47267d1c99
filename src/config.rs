use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pipeline::Technique;
use crate::table::Table;
use crate::types::{AttributeRole, Result};

/// Run configuration: attribute roles plus the technique to apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Role tag per attribute; unlisted attributes are `other`
    #[serde(default)]
    pub roles: BTreeMap<String, AttributeRole>,
    pub technique: Technique,
}

impl AnonymizationConfig {
    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.technique.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.technique.validate()?;
        Ok(config)
    }

    /// Tag the table's columns with the configured roles
    pub fn apply_roles(&self, table: &Table) -> Result<Table> {
        table.with_roles(&self.roles)
    }
}
