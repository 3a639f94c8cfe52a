use std::cmp::Ordering;

use serde::Serialize;

use super::domain::{Criterion, Team, TeamId};
use super::engine;

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTeam {
    pub rank: usize,
    pub team_id: TeamId,
    pub name: String,
    pub total: f64,
}

impl RankedTeam {
    /// Banner line for the current leader, e.g. `Team Alpha with 82.50%`.
    pub fn headline(&self) -> String {
        format!("{} with {:.2}%", self.name, self.total)
    }
}

/// Fully ordered standings: total descending, then name ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ranking {
    entries: Vec<RankedTeam>,
}

impl Ranking {
    /// Ranks already-computed totals. Input order only matters when both the
    /// total and the name compare equal.
    pub fn from_totals<I>(totals: I) -> Self
    where
        I: IntoIterator<Item = (TeamId, String, f64)>,
    {
        let mut rows: Vec<(TeamId, String, f64)> = totals.into_iter().collect();
        rows.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| compare_names(&a.1, &b.1))
        });

        let entries = rows
            .into_iter()
            .enumerate()
            .map(|(index, (team_id, name, total))| RankedTeam {
                rank: index + 1,
                team_id,
                name,
                total,
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[RankedTeam] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<RankedTeam> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-ranked team, or `None` when nobody is being judged.
    pub fn leader(&self) -> Option<&RankedTeam> {
        self.entries.first()
    }

    pub fn top(&self, count: usize) -> &[RankedTeam] {
        &self.entries[..count.min(self.entries.len())]
    }

    /// 1-based rank, or 0 for a team that is not on the board.
    pub fn rank_of(&self, team_id: &TeamId) -> usize {
        self.entries
            .iter()
            .find(|entry| &entry.team_id == team_id)
            .map(|entry| entry.rank)
            .unwrap_or(0)
    }

    pub fn total_of(&self, team_id: &TeamId) -> f64 {
        self.entries
            .iter()
            .find(|entry| &entry.team_id == team_id)
            .map(|entry| entry.total)
            .unwrap_or(0.0)
    }
}

/// Scores every team against `criteria` and ranks the result.
pub fn rank_teams(criteria: &[Criterion], teams: &[Team]) -> Ranking {
    Ranking::from_totals(
        teams
            .iter()
            .map(|team| (team.id.clone(), team.name.clone(), engine::total(team, criteria))),
    )
}

/// Dictionary-style name ordering: letters compare case-insensitively first and
/// a lowercase spelling sorts ahead of its capitalised twin.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded.then_with(|| {
        a.chars()
            .zip(b.chars())
            .find(|(left, right)| left != right)
            .map(|(left, right)| match (left.is_lowercase(), right.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => left.cmp(&right),
            })
            .unwrap_or_else(|| a.len().cmp(&b.len()))
    })
}
