use serde::Serialize;

use super::domain::{Criterion, CriterionId, Team, TeamId};

/// Share of `criterion.weight` earned by `team`.
///
/// Absent scores count as zero. A zero (or otherwise unusable) `max` yields zero
/// rather than letting NaN or infinity into the total. Raw values are clamped
/// into `[0, max]` even though entry points already clamp them.
pub fn contribution(team: &Team, criterion: &Criterion) -> f64 {
    let max = criterion.max;
    if !max.is_finite() || max <= 0.0 || !criterion.weight.is_finite() {
        return 0.0;
    }

    let raw = match team.raw_score(&criterion.id) {
        Some(raw) if raw.is_finite() => raw.clamp(0.0, max),
        _ => 0.0,
    };

    (raw / max) * criterion.weight
}

/// Sum of contributions over the project's current criteria. Score entries for
/// criteria that are not in `criteria` are never read.
pub fn total(team: &Team, criteria: &[Criterion]) -> f64 {
    criteria
        .iter()
        .map(|criterion| contribution(team, criterion))
        .sum()
}

/// Configured weight across all criteria. Not required to equal 100.
pub fn total_weight(criteria: &[Criterion]) -> f64 {
    criteria
        .iter()
        .map(|criterion| {
            if criterion.weight.is_finite() {
                criterion.weight
            } else {
                0.0
            }
        })
        .sum()
}

pub fn weight_balanced(criteria: &[Criterion]) -> bool {
    total_weight(criteria) == 100.0
}

/// Per-criterion line of a team's score sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionLine {
    pub criterion_id: CriterionId,
    pub criterion: String,
    pub raw: Option<f64>,
    pub contribution: f64,
}

/// Transparent view of how a team's total was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub team_id: TeamId,
    pub total: f64,
    pub lines: Vec<ContributionLine>,
}

pub fn breakdown(team: &Team, criteria: &[Criterion]) -> ScoreBreakdown {
    let lines: Vec<ContributionLine> = criteria
        .iter()
        .map(|criterion| ContributionLine {
            criterion_id: criterion.id.clone(),
            criterion: criterion.name.clone(),
            raw: team.raw_score(&criterion.id),
            contribution: contribution(team, criterion),
        })
        .collect();
    let total = lines.iter().map(|line| line.contribution).sum();

    ScoreBreakdown {
        team_id: team.id.clone(),
        total,
        lines,
    }
}
