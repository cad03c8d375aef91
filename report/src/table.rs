//! The unified table: one row per planner result, open schema.
//!
//! Rows keep the typed [`ArtifactKey`] of the directory they came from next to
//! the fields the planner wrote, so grouping and partitioning still work when
//! an artifact lacks the `demands` or `single_transponder_for_all` fields.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sweep::core::layout::{ArtifactKey, TransponderPolicy};

pub const DEMANDS_FIELD: &str = "demands";
pub const POLICY_FIELD: &str = "single_transponder_for_all";

/// A single cell. Absent cells are simply missing from the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Infer a cell from artifact text. Empty text is an absent cell.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.eq_ignore_ascii_case("true") {
            return Some(Self::Bool(true));
        }
        if raw.eq_ignore_ascii_case("false") {
            return Some(Self::Bool(false));
        }
        match raw.parse::<f64>() {
            Ok(number) if number.is_finite() => Some(Self::Number(number)),
            _ => Some(Self::Text(raw.to_string())),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            Self::Number(number) if *number == 0.0 => Some(false),
            Self::Number(number) if *number == 1.0 => Some(true),
            _ => None,
        }
    }
}

pub type Fields = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub key: ArtifactKey,
    pub fields: Fields,
}

impl Row {
    pub fn new(key: ArtifactKey, fields: Fields) -> Self {
        Self { key, fields }
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    /// Demand count: the `demands` field if it is a whole number, else the key.
    pub fn demands(&self) -> u64 {
        self.number(DEMANDS_FIELD)
            .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
            .map_or(self.key.demands, |n| n as u64)
    }

    /// Skew comes only from the directory the artifact was found in.
    pub fn skew(&self) -> f64 {
        self.key.skew
    }

    /// Policy: the `single_transponder_for_all` field if boolean, else the key.
    pub fn policy(&self) -> TransponderPolicy {
        self.fields
            .get(POLICY_FIELD)
            .and_then(Value::as_bool)
            .map_or(self.key.policy, TransponderPolicy::from_single_flag)
    }
}

/// Concatenation of every artifact's rows. Rows are never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedTable {
    pub rows: Vec<Row>,
}

impl UnifiedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Union of field names across all rows.
    pub fn columns(&self) -> BTreeSet<&str> {
        self.rows
            .iter()
            .flat_map(|row| row.fields.keys().map(String::as_str))
            .collect()
    }

    pub fn partition(&self) -> Partitions<'_> {
        let (single, multiple): (Vec<&Row>, Vec<&Row>) = self
            .rows
            .iter()
            .partition(|row| row.policy() == TransponderPolicy::Single);
        Partitions { single, multiple }
    }
}

/// The table split by transponder policy. Every row lands in exactly one side.
#[derive(Debug, Clone)]
pub struct Partitions<'a> {
    pub single: Vec<&'a Row>,
    pub multiple: Vec<&'a Row>,
}

impl<'a> Partitions<'a> {
    pub fn get(&self, policy: TransponderPolicy) -> &[&'a Row] {
        match policy {
            TransponderPolicy::Single => &self.single,
            TransponderPolicy::Multiple => &self.multiple,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TransponderPolicy, &[&'a Row])> {
        TransponderPolicy::ALL
            .into_iter()
            .map(move |policy| (policy, self.get(policy)))
    }
}

/// Rows grouped by skew, in ascending skew order. Row order within a group is kept.
pub fn by_skew<'a>(rows: &[&'a Row]) -> Vec<(f64, Vec<&'a Row>)> {
    let mut groups: Vec<(f64, Vec<&'a Row>)> = Vec::new();
    for row in rows
        .iter()
        .copied()
        .sorted_by(|a, b| a.skew().total_cmp(&b.skew()))
    {
        match groups.last_mut() {
            Some((skew, group)) if *skew == row.skew() => group.push(row),
            _ => groups.push((row.skew(), vec![row])),
        }
    }
    groups
}
