//! Application state and its reducer.
//!
//! `AppState::apply` never mutates the receiver: it clones, applies one
//! [`Action`], repairs the selection, and hands back the next state. Actions that
//! name an unknown project, team, or criterion leave the state unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::domain::{
    clamp_score, lenient_vec, now_millis, Criterion, CriterionId, CriterionPatch, Project, ProjectId,
    ProjectPatch, Team, TeamId,
};

pub const DEFAULT_PROJECT_NAME: &str = "Robotics Showcase 2025";
pub const NEW_PROJECT_NAME: &str = "New Robotics Event";
pub const PLACEHOLDER_TEAMS: [&str; 2] = ["Team Alpha", "Team Beta"];

/// Every project plus the one currently being judged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    #[serde(deserialize_with = "lenient_vec")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "lenient_selection")]
    pub selected_project_id: Option<ProjectId>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::seeded(now_millis())
    }
}

impl AppState {
    pub fn empty() -> Self {
        Self {
            projects: Vec::new(),
            selected_project_id: None,
        }
    }

    /// First-run state: one project with the canonical rubric and two placeholder teams.
    pub fn seeded(created_at: i64) -> Self {
        let mut project = Project::from_template(DEFAULT_PROJECT_NAME, created_at);
        project.teams = PLACEHOLDER_TEAMS.iter().map(|name| Team::new(*name)).collect();
        let selected_project_id = Some(project.id.clone());

        Self {
            projects: vec![project],
            selected_project_id,
        }
    }

    /// Rehydrates a stored snapshot. Missing fields take their defaults and an
    /// unreadable document yields the seeded state.
    pub fn from_snapshot(raw: &str) -> Self {
        let mut state = match serde_json::from_str::<AppState>(raw) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(error = %err, "stored snapshot unreadable; starting from defaults");
                AppState::default()
            }
        };
        for project in &mut state.projects {
            project.normalize();
        }
        state.heal_selection();
        state
    }

    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| &project.id == id)
    }

    pub fn selected(&self) -> Option<&Project> {
        self.selected_project_id
            .as_ref()
            .and_then(|id| self.project(id))
    }

    /// Pure transition: `self` is left untouched.
    pub fn apply(&self, action: Action) -> AppState {
        let mut next = self.clone();
        next.reduce(action);
        next.heal_selection();
        next
    }

    /// Points a dangling selection at the first project, or clears it.
    pub fn heal_selection(&mut self) {
        let resolves = self
            .selected_project_id
            .as_ref()
            .is_some_and(|id| self.projects.iter().any(|project| &project.id == id));

        if !resolves {
            self.selected_project_id = self.projects.first().map(|project| project.id.clone());
        }
    }

    fn project_mut(&mut self, id: &ProjectId) -> Option<&mut Project> {
        self.projects.iter_mut().find(|project| &project.id == id)
    }

    fn reduce(&mut self, action: Action) {
        match action {
            Action::CreateProject(project) => {
                self.selected_project_id = Some(project.id.clone());
                self.projects.insert(0, project);
            }
            Action::RenameProject { project_id, name } => {
                if let Some(project) = self.project_mut(&project_id) {
                    project.name = name;
                }
            }
            Action::SelectProject(project_id) => {
                if self.project(&project_id).is_some() {
                    self.selected_project_id = Some(project_id);
                }
            }
            Action::UpdateProject { project_id, patch } => {
                if let Some(project) = self.project_mut(&project_id) {
                    project.apply(patch);
                }
            }
            Action::DeleteProject(project_id) => {
                self.projects.retain(|project| project.id != project_id);
            }
            Action::AddCriterion {
                project_id,
                criterion,
            } => {
                if let Some(project) = self.project_mut(&project_id) {
                    project.criteria.push(criterion);
                }
            }
            Action::UpdateCriterion {
                project_id,
                criterion_id,
                patch,
            } => {
                if let Some(criterion) = self
                    .project_mut(&project_id)
                    .and_then(|project| criterion_mut(project, &criterion_id))
                {
                    criterion.apply(patch);
                }
            }
            Action::RemoveCriterion {
                project_id,
                criterion_id,
            } => {
                // Score entries keyed by this criterion stay on the teams.
                if let Some(project) = self.project_mut(&project_id) {
                    project.criteria.retain(|criterion| criterion.id != criterion_id);
                }
            }
            Action::AddTeam {
                project_id,
                team_id,
                name,
            } => {
                if let Some(project) = self.project_mut(&project_id) {
                    let name = name.unwrap_or_else(|| format!("Team {}", project.teams.len() + 1));
                    project.teams.push(Team {
                        id: team_id,
                        name,
                        scores: Default::default(),
                    });
                }
            }
            Action::RenameTeam {
                project_id,
                team_id,
                name,
            } => {
                if let Some(team) = self
                    .project_mut(&project_id)
                    .and_then(|project| team_mut(project, &team_id))
                {
                    team.name = name;
                }
            }
            Action::RemoveTeam {
                project_id,
                team_id,
            } => {
                if let Some(project) = self.project_mut(&project_id) {
                    project.teams.retain(|team| team.id != team_id);
                }
            }
            Action::SetScore {
                project_id,
                team_id,
                criterion_id,
                value,
            } => {
                let Some(project) = self.project_mut(&project_id) else {
                    return;
                };
                let Some(max) = project
                    .criteria
                    .iter()
                    .find(|criterion| criterion.id == criterion_id)
                    .map(|criterion| criterion.max)
                else {
                    return;
                };
                if let Some(team) = team_mut(project, &team_id) {
                    team.scores.insert(criterion_id, clamp_score(value, max));
                }
            }
        }
    }
}

fn lenient_selection<'de, D>(deserializer: D) -> Result<Option<ProjectId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(id) if !id.is_empty() => Some(ProjectId(id)),
        _ => None,
    })
}

fn criterion_mut<'a>(project: &'a mut Project, id: &CriterionId) -> Option<&'a mut Criterion> {
    project.criteria.iter_mut().find(|criterion| &criterion.id == id)
}

fn team_mut<'a>(project: &'a mut Project, id: &TeamId) -> Option<&'a mut Team> {
    project.teams.iter_mut().find(|team| &team.id == id)
}

/// Discrete state transitions. Anything needing fresh identifiers or a clock
/// carries them in the action so the reducer stays deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Prepends the project and selects it.
    CreateProject(Project),
    RenameProject {
        project_id: ProjectId,
        name: String,
    },
    SelectProject(ProjectId),
    UpdateProject {
        project_id: ProjectId,
        patch: ProjectPatch,
    },
    DeleteProject(ProjectId),
    AddCriterion {
        project_id: ProjectId,
        criterion: Criterion,
    },
    UpdateCriterion {
        project_id: ProjectId,
        criterion_id: CriterionId,
        patch: CriterionPatch,
    },
    RemoveCriterion {
        project_id: ProjectId,
        criterion_id: CriterionId,
    },
    /// `name: None` names the team `Team N` after the current team count.
    AddTeam {
        project_id: ProjectId,
        team_id: TeamId,
        name: Option<String>,
    },
    RenameTeam {
        project_id: ProjectId,
        team_id: TeamId,
        name: String,
    },
    RemoveTeam {
        project_id: ProjectId,
        team_id: TeamId,
    },
    /// Value is clamped into `[0, max]` of the criterion.
    SetScore {
        project_id: ProjectId,
        team_id: TeamId,
        criterion_id: CriterionId,
        value: f64,
    },
}

impl Action {
    /// Short tag for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::CreateProject(_) => "create_project",
            Action::RenameProject { .. } => "rename_project",
            Action::SelectProject(_) => "select_project",
            Action::UpdateProject { .. } => "update_project",
            Action::DeleteProject(_) => "delete_project",
            Action::AddCriterion { .. } => "add_criterion",
            Action::UpdateCriterion { .. } => "update_criterion",
            Action::RemoveCriterion { .. } => "remove_criterion",
            Action::AddTeam { .. } => "add_team",
            Action::RenameTeam { .. } => "rename_team",
            Action::RemoveTeam { .. } => "remove_team",
            Action::SetScore { .. } => "set_score",
        }
    }
}
