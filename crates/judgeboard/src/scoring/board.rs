use serde::Serialize;

use super::domain::{CriterionId, Project, ProjectId, TeamId};
use super::engine;
use super::progress::{progress, Progress};
use super::ranking::{rank_teams, RankedTeam};

/// Number of teams shown in the live podium.
pub const PODIUM_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionColumn {
    pub criterion_id: CriterionId,
    pub name: String,
    pub weight: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCell {
    pub criterion_id: CriterionId,
    pub raw: Option<f64>,
    pub contribution: f64,
}

/// One team row in project order, annotated with its standing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRow {
    pub team_id: TeamId,
    pub name: String,
    pub cells: Vec<ScoreCell>,
    pub total: f64,
    pub rank: usize,
}

/// Everything a display needs for one project, recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scoreboard {
    pub project_id: ProjectId,
    pub project_name: String,
    pub criteria: Vec<CriterionColumn>,
    pub teams: Vec<TeamRow>,
    pub standings: Vec<RankedTeam>,
    pub leader: Option<RankedTeam>,
    pub podium: Vec<RankedTeam>,
    pub progress: Progress,
    pub total_weight: f64,
    pub weight_balanced: bool,
}

impl Scoreboard {
    pub fn build(project: &Project) -> Self {
        let ranking = rank_teams(&project.criteria, &project.teams);

        let criteria = project
            .criteria
            .iter()
            .map(|criterion| CriterionColumn {
                criterion_id: criterion.id.clone(),
                name: criterion.name.clone(),
                weight: criterion.weight,
                max: criterion.max,
            })
            .collect();

        let teams = project
            .teams
            .iter()
            .map(|team| {
                let sheet = engine::breakdown(team, &project.criteria);
                TeamRow {
                    team_id: team.id.clone(),
                    name: team.name.clone(),
                    cells: sheet
                        .lines
                        .into_iter()
                        .map(|line| ScoreCell {
                            criterion_id: line.criterion_id,
                            raw: line.raw,
                            contribution: line.contribution,
                        })
                        .collect(),
                    total: sheet.total,
                    rank: ranking.rank_of(&team.id),
                }
            })
            .collect();

        let leader = ranking.leader().cloned();
        let podium = ranking.top(PODIUM_SIZE).to_vec();
        let total_weight = engine::total_weight(&project.criteria);

        Self {
            project_id: project.id.clone(),
            project_name: project.name.clone(),
            criteria,
            teams,
            standings: ranking.into_entries(),
            leader,
            podium,
            progress: progress(project),
            total_weight,
            weight_balanced: engine::weight_balanced(&project.criteria),
        }
    }
}
