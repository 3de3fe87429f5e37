//! JSON and YAML relation documents: a sequence of
//! `{ id: ..., manager: ... }` entries.

use serde::Deserialize;

use super::LoadError;
use crate::domain::{Config, Relation};

#[derive(Debug, Deserialize)]
struct RawRelation {
    #[serde(alias = "email")]
    id: String,
    #[serde(default)]
    manager: Option<String>,
}

impl RawRelation {
    fn into_relation(self, record: usize, config: &Config) -> Result<Relation, LoadError> {
        super::relation(record, &self.id, self.manager.as_deref(), config)
    }
}

fn convert(raw: Vec<RawRelation>, config: &Config) -> Result<Vec<Relation>, LoadError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, relation)| relation.into_relation(index + 1, config))
        .collect()
}

pub(super) fn parse_json(content: &str, config: &Config) -> Result<Vec<Relation>, LoadError> {
    convert(serde_json::from_str(content)?, config)
}

pub(super) fn parse_yaml(content: &str, config: &Config) -> Result<Vec<Relation>, LoadError> {
    convert(serde_yaml::from_str(content)?, config)
}
