//! Criteria, teams, and projects as they are persisted.
//!
//! Field names follow the stored snapshot layout (`createdAt`, `selectedProjectId`)
//! so snapshots written by earlier sessions keep loading. Every field tolerates
//! absence and malformed values; nothing in here rejects a document.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identifier wrapper for scoring criteria.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionId(pub String);

impl CriterionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for judged teams.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for judging projects, always prefixed with `proj-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn generate() -> Self {
        Self(format!("proj-{}", Uuid::new_v4().simple()))
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const DEFAULT_CRITERION_NAME: &str = "Criterion";
pub const DEFAULT_CRITERION_WEIGHT: f64 = 10.0;
pub const DEFAULT_CRITERION_MAX: f64 = 10.0;

/// Canonical rubric every new project starts with: (name, weight %, max points).
pub const CANONICAL_CRITERIA: [(&str, f64, f64); 6] = [
    ("Impact", 20.0, 10.0),
    ("Creativity", 20.0, 10.0),
    ("Innovation", 15.0, 10.0),
    ("Technical", 20.0, 10.0),
    ("Teamwork", 15.0, 10.0),
    ("Presentation", 10.0, 10.0),
];

/// Weighted judging dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    #[serde(default = "CriterionId::generate")]
    pub id: CriterionId,
    #[serde(default = "default_criterion_name", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default = "default_criterion_weight", deserialize_with = "lenient_amount")]
    pub weight: f64,
    #[serde(default = "default_criterion_max", deserialize_with = "lenient_amount")]
    pub max: f64,
}

impl Criterion {
    pub fn new(name: impl Into<String>, weight: f64, max: f64) -> Self {
        Self {
            id: CriterionId::generate(),
            name: name.into(),
            weight: sanitize_amount(weight),
            max: sanitize_amount(max),
        }
    }

    pub fn canonical_set() -> Vec<Criterion> {
        CANONICAL_CRITERIA
            .iter()
            .map(|(name, weight, max)| Criterion::new(*name, *weight, *max))
            .collect()
    }

    pub(crate) fn apply(&mut self, patch: CriterionPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(weight) = patch.weight {
            self.weight = sanitize_amount(weight);
        }
        if let Some(max) = patch.max {
            self.max = sanitize_amount(max);
        }
    }
}

impl Default for Criterion {
    fn default() -> Self {
        Criterion::new(
            DEFAULT_CRITERION_NAME,
            DEFAULT_CRITERION_WEIGHT,
            DEFAULT_CRITERION_MAX,
        )
    }
}

/// Partial criterion edit; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_number")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient_optional_number")]
    pub max: Option<f64>,
}

/// Entity being judged. `scores` is sparse: a missing key means "not yet judged",
/// which is different from an explicit zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(default = "TeamId::generate")]
    pub id: TeamId,
    #[serde(default = "default_team_name", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_scores")]
    pub scores: BTreeMap<CriterionId, f64>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TeamId::generate(),
            name: name.into(),
            scores: BTreeMap::new(),
        }
    }

    /// Stored raw value, including entries for criteria that no longer exist.
    pub fn raw_score(&self, criterion: &CriterionId) -> Option<f64> {
        self.scores.get(criterion).copied()
    }

    pub fn has_score(&self, criterion: &CriterionId) -> bool {
        self.scores.contains_key(criterion)
    }
}

/// Self-contained judging event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default = "ProjectId::generate")]
    pub id: ProjectId,
    #[serde(default = "default_project_name", deserialize_with = "lenient_string")]
    pub name: String,
    /// Unix timestamp in milliseconds.
    #[serde(default = "now_millis", deserialize_with = "lenient_timestamp")]
    pub created_at: i64,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub criteria: Vec<Criterion>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub teams: Vec<Team>,
}

impl Project {
    /// New project carrying the canonical rubric and no teams.
    pub fn from_template(name: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: ProjectId::generate(),
            name: name.into(),
            created_at,
            criteria: Criterion::canonical_set(),
            teams: Vec::new(),
        }
    }

    pub fn criterion(&self, id: &CriterionId) -> Option<&Criterion> {
        self.criteria.iter().find(|criterion| &criterion.id == id)
    }

    pub fn team(&self, id: &TeamId) -> Option<&Team> {
        self.teams.iter().find(|team| &team.id == id)
    }

    pub(crate) fn apply(&mut self, patch: ProjectPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(criteria) = patch.criteria {
            self.criteria = criteria;
        }
        if let Some(teams) = patch.teams {
            self.teams = teams;
        }
        self.normalize();
    }

    /// Re-applies entry rules to client-supplied or rehydrated data. Scores keyed
    /// by a current criterion end up in `[0, max]`; repeated ids get fresh ones.
    pub(crate) fn normalize(&mut self) {
        let mut criterion_ids = HashSet::new();
        for criterion in &mut self.criteria {
            criterion.weight = sanitize_amount(criterion.weight);
            criterion.max = sanitize_amount(criterion.max);
            if !criterion_ids.insert(criterion.id.clone()) {
                criterion.id = CriterionId::generate();
                criterion_ids.insert(criterion.id.clone());
            }
        }

        let mut team_ids = HashSet::new();
        for team in &mut self.teams {
            if !team_ids.insert(team.id.clone()) {
                tracing::warn!(team = %team.id, "reissuing repeated team id");
                team.id = TeamId::generate();
                team_ids.insert(team.id.clone());
            }
            for (criterion_id, score) in team.scores.iter_mut() {
                let current = self
                    .criteria
                    .iter()
                    .find(|candidate| &candidate.id == criterion_id);
                *score = match current {
                    Some(criterion) => clamp_score(*score, criterion.max),
                    None => sanitize_amount(*score),
                };
            }
        }
    }
}

/// Partial project replacement, applied field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub criteria: Option<Vec<Criterion>>,
    #[serde(default)]
    pub teams: Option<Vec<Team>>,
}

/// Non-finite and negative entries collapse to zero.
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Clamps a judge's entry into `[0, max]`; garbage becomes zero.
pub fn clamp_score(value: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let ceiling = sanitize_amount(max);
    value.max(0.0).min(ceiling)
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Reads a JSON value as a finite number, accepting numeric strings.
pub fn coerce_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|number| number.is_finite()).unwrap_or(0.0)
}

fn default_criterion_name() -> String {
    DEFAULT_CRITERION_NAME.to_string()
}

fn default_criterion_weight() -> f64 {
    DEFAULT_CRITERION_WEIGHT
}

fn default_criterion_max() -> f64 {
    DEFAULT_CRITERION_MAX
}

fn default_team_name() -> String {
    "Team".to_string()
}

fn default_project_name() -> String {
    "Untitled Project".to_string()
}

pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer).map(sanitize_amount)
}

pub(crate) fn lenient_optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(coerce_number(&other)),
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let millis = coerce_number(&value);
    if millis > 0.0 && millis < i64::MAX as f64 {
        Ok(millis as i64)
    } else {
        Ok(now_millis())
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(raw) => raw,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    })
}

fn lenient_scores<'de, D>(deserializer: D) -> Result<BTreeMap<CriterionId, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(entries) = value else {
        return Ok(BTreeMap::new());
    };

    Ok(entries
        .into_iter()
        .map(|(key, raw)| (CriterionId(key), coerce_number(&raw)))
        .collect())
}

/// Keeps the well-formed elements of an array and drops the rest.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if kept.len() < total {
        tracing::warn!(
            dropped = total - kept.len(),
            "discarded malformed entries while reading snapshot"
        );
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clamp_score_bounds_entries() {
        assert_eq!(clamp_score(12.0, 10.0), 10.0);
        assert_eq!(clamp_score(-3.0, 10.0), 0.0);
        assert_eq!(clamp_score(7.5, 10.0), 7.5);
        assert_eq!(clamp_score(f64::NAN, 10.0), 0.0);
        assert_eq!(clamp_score(4.0, 0.0), 0.0);
    }

    #[test]
    fn criterion_reads_garbage_fields_as_zero() {
        let criterion: Criterion = serde_json::from_value(json!({
            "id": "c1",
            "name": "Impact",
            "weight": "heavy",
            "max": null,
        }))
        .expect("criterion parses");

        assert_eq!(criterion.id, CriterionId("c1".to_string()));
        assert_eq!(criterion.weight, 0.0);
        assert_eq!(criterion.max, 0.0);
    }

    #[test]
    fn criterion_missing_fields_take_defaults() {
        let criterion: Criterion =
            serde_json::from_value(json!({ "id": "c9" })).expect("criterion parses");

        assert_eq!(criterion.name, DEFAULT_CRITERION_NAME);
        assert_eq!(criterion.weight, DEFAULT_CRITERION_WEIGHT);
        assert_eq!(criterion.max, DEFAULT_CRITERION_MAX);
    }

    #[test]
    fn team_scores_accept_numeric_strings() {
        let team: Team = serde_json::from_value(json!({
            "id": "t1",
            "name": "Alpha",
            "scores": { "c1": "7", "c2": 0, "c3": "n/a" },
        }))
        .expect("team parses");

        assert_eq!(team.raw_score(&CriterionId("c1".to_string())), Some(7.0));
        assert_eq!(team.raw_score(&CriterionId("c2".to_string())), Some(0.0));
        assert_eq!(team.raw_score(&CriterionId("c3".to_string())), Some(0.0));
        assert!(!team.has_score(&CriterionId("c4".to_string())));
    }

    #[test]
    fn project_serializes_with_snapshot_field_names() {
        let project = Project::from_template("Finals", 1_700_000_000_000);
        let value = serde_json::to_value(&project).expect("serializes");

        assert_eq!(value["createdAt"], json!(1_700_000_000_000_i64));
        assert_eq!(value["criteria"].as_array().map(Vec::len), Some(6));
        assert!(value["id"]
            .as_str()
            .is_some_and(|id| id.starts_with("proj-")));
        assert_eq!(value["criteria"][0]["name"], json!("Impact"));
        assert_eq!(value["criteria"][0]["weight"], json!(20.0));
    }

    #[test]
    fn project_drops_malformed_teams() {
        let project: Project = serde_json::from_value(json!({
            "id": "proj-1",
            "name": "Regionals",
            "createdAt": 1_700_000_000_000_i64,
            "criteria": "oops",
            "teams": [{ "id": "t1", "name": "Alpha", "scores": {} }, 42],
        }))
        .expect("project parses");

        assert!(project.criteria.is_empty());
        assert_eq!(project.teams.len(), 1);
        assert_eq!(project.teams[0].name, "Alpha");
    }

    #[test]
    fn generated_identifiers_are_distinct() {
        let ids: std::collections::HashSet<_> =
            (0..500).map(|_| CriterionId::generate()).collect();
        assert_eq!(ids.len(), 500);
    }
}
