use std::sync::Arc;

use tracing::{debug, info, warn};

use super::board::Scoreboard;
use super::container::{Action, AppState, NEW_PROJECT_NAME};
use super::domain::{
    now_millis, Criterion, CriterionId, CriterionPatch, Project, ProjectId, ProjectPatch, Team,
    TeamId, DEFAULT_CRITERION_MAX, DEFAULT_CRITERION_NAME, DEFAULT_CRITERION_WEIGHT,
};
use super::export::{export_project, CsvExport, ExportError};
use super::storage::StateStore;

/// Fields for a new criterion; anything unset takes the standard defaults.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct CriterionDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::domain::lenient_optional_number")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "super::domain::lenient_optional_number")]
    pub max: Option<f64>,
}

impl CriterionDraft {
    fn into_criterion(self) -> Criterion {
        Criterion::new(
            self.name
                .unwrap_or_else(|| DEFAULT_CRITERION_NAME.to_string()),
            self.weight.unwrap_or(DEFAULT_CRITERION_WEIGHT),
            self.max.unwrap_or(DEFAULT_CRITERION_MAX),
        )
    }
}

/// Owns the live application state and the store it is mirrored into.
///
/// Every mutation goes through [`ScoringSession::dispatch`]: reduce, heal the
/// selection, then write a full snapshot. A failed write is logged and dropped;
/// the in-memory state stays authoritative.
pub struct ScoringSession<S> {
    store: Arc<S>,
    key: String,
    state: AppState,
}

impl<S> ScoringSession<S>
where
    S: StateStore + 'static,
{
    /// Loads the stored snapshot under `key`, falling back to the seeded state
    /// when nothing is stored or the store cannot be read.
    pub fn open(store: Arc<S>, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = match store.load(&key) {
            Ok(Some(raw)) => AppState::from_snapshot(&raw),
            Ok(None) => {
                info!(%key, "no stored judging state; seeding defaults");
                AppState::default()
            }
            Err(err) => {
                warn!(%key, error = %err, "unable to read judging state; seeding defaults");
                AppState::default()
            }
        };

        Self::with_state(store, key, state)
    }

    pub fn with_state(store: Arc<S>, key: impl Into<String>, mut state: AppState) -> Self {
        state.heal_selection();
        Self {
            store,
            key: key.into(),
            state,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn dispatch(&mut self, action: Action) -> &AppState {
        let kind = action.kind();
        self.state = self.state.apply(action);
        debug!(action = kind, projects = self.state.projects.len(), "state transition applied");
        self.persist();
        &self.state
    }

    fn persist(&self) {
        let snapshot = match self.state.to_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "unable to serialize judging state; skipping save");
                return;
            }
        };

        if let Err(err) = self.store.save(&self.key, &snapshot) {
            warn!(key = %self.key, error = %err, "judging state not persisted");
        }
    }

    /// Prepends a project carrying the canonical rubric and selects it.
    pub fn create_project(&mut self) -> Project {
        let project = Project::from_template(NEW_PROJECT_NAME, now_millis());
        info!(project_id = %project.id, "project created");
        self.dispatch(Action::CreateProject(project.clone()));
        project
    }

    pub fn rename_project(
        &mut self,
        project_id: &ProjectId,
        name: impl Into<String>,
    ) -> Result<&Project, SessionError> {
        self.require_project(project_id)?;
        self.dispatch(Action::RenameProject {
            project_id: project_id.clone(),
            name: name.into(),
        });
        self.project(project_id)
    }

    pub fn select_project(&mut self, project_id: &ProjectId) -> Result<&Project, SessionError> {
        self.require_project(project_id)?;
        self.dispatch(Action::SelectProject(project_id.clone()));
        self.project(project_id)
    }

    pub fn update_project(
        &mut self,
        project_id: &ProjectId,
        patch: ProjectPatch,
    ) -> Result<&Project, SessionError> {
        self.require_project(project_id)?;
        self.dispatch(Action::UpdateProject {
            project_id: project_id.clone(),
            patch,
        });
        self.project(project_id)
    }

    pub fn delete_project(&mut self, project_id: &ProjectId) -> Result<(), SessionError> {
        self.require_project(project_id)?;
        self.dispatch(Action::DeleteProject(project_id.clone()));
        info!(%project_id, "project deleted");
        Ok(())
    }

    pub fn add_criterion(
        &mut self,
        project_id: &ProjectId,
        draft: CriterionDraft,
    ) -> Result<Criterion, SessionError> {
        self.require_project(project_id)?;
        let criterion = draft.into_criterion();
        self.dispatch(Action::AddCriterion {
            project_id: project_id.clone(),
            criterion: criterion.clone(),
        });
        Ok(criterion)
    }

    pub fn update_criterion(
        &mut self,
        project_id: &ProjectId,
        criterion_id: &CriterionId,
        patch: CriterionPatch,
    ) -> Result<Criterion, SessionError> {
        self.require_criterion(project_id, criterion_id)?;
        self.dispatch(Action::UpdateCriterion {
            project_id: project_id.clone(),
            criterion_id: criterion_id.clone(),
            patch,
        });
        self.require_criterion(project_id, criterion_id).cloned()
    }

    /// Removes the column; teams keep their entries for it, which the engine ignores.
    pub fn remove_criterion(
        &mut self,
        project_id: &ProjectId,
        criterion_id: &CriterionId,
    ) -> Result<(), SessionError> {
        self.require_criterion(project_id, criterion_id)?;
        self.dispatch(Action::RemoveCriterion {
            project_id: project_id.clone(),
            criterion_id: criterion_id.clone(),
        });
        Ok(())
    }

    pub fn add_team(
        &mut self,
        project_id: &ProjectId,
        name: Option<String>,
    ) -> Result<Team, SessionError> {
        self.require_project(project_id)?;
        let team_id = TeamId::generate();
        self.dispatch(Action::AddTeam {
            project_id: project_id.clone(),
            team_id: team_id.clone(),
            name,
        });
        self.require_team(project_id, &team_id).cloned()
    }

    pub fn rename_team(
        &mut self,
        project_id: &ProjectId,
        team_id: &TeamId,
        name: impl Into<String>,
    ) -> Result<Team, SessionError> {
        self.require_team(project_id, team_id)?;
        self.dispatch(Action::RenameTeam {
            project_id: project_id.clone(),
            team_id: team_id.clone(),
            name: name.into(),
        });
        self.require_team(project_id, team_id).cloned()
    }

    pub fn remove_team(
        &mut self,
        project_id: &ProjectId,
        team_id: &TeamId,
    ) -> Result<(), SessionError> {
        self.require_team(project_id, team_id)?;
        self.dispatch(Action::RemoveTeam {
            project_id: project_id.clone(),
            team_id: team_id.clone(),
        });
        Ok(())
    }

    /// Stores a judge's entry, clamped into `[0, max]`. Returns the stored value.
    pub fn set_score(
        &mut self,
        project_id: &ProjectId,
        team_id: &TeamId,
        criterion_id: &CriterionId,
        value: f64,
    ) -> Result<f64, SessionError> {
        self.require_criterion(project_id, criterion_id)?;
        self.require_team(project_id, team_id)?;
        self.dispatch(Action::SetScore {
            project_id: project_id.clone(),
            team_id: team_id.clone(),
            criterion_id: criterion_id.clone(),
            value,
        });
        Ok(self
            .require_team(project_id, team_id)?
            .raw_score(criterion_id)
            .unwrap_or(0.0))
    }

    pub fn scoreboard(&self, project_id: &ProjectId) -> Result<Scoreboard, SessionError> {
        self.project(project_id).map(Scoreboard::build)
    }

    pub fn export(&self, project_id: &ProjectId) -> Result<CsvExport, SessionError> {
        let project = self.project(project_id)?;
        Ok(export_project(project)?)
    }

    /// Project currently being judged.
    pub fn selected(&self) -> Result<&Project, SessionError> {
        self.state.selected().ok_or(SessionError::NoSelection)
    }

    pub fn project(&self, project_id: &ProjectId) -> Result<&Project, SessionError> {
        self.state
            .project(project_id)
            .ok_or_else(|| SessionError::ProjectNotFound(project_id.clone()))
    }

    fn require_project(&self, project_id: &ProjectId) -> Result<(), SessionError> {
        self.project(project_id).map(|_| ())
    }

    fn require_criterion(
        &self,
        project_id: &ProjectId,
        criterion_id: &CriterionId,
    ) -> Result<&Criterion, SessionError> {
        self.project(project_id)?
            .criterion(criterion_id)
            .ok_or_else(|| SessionError::CriterionNotFound(criterion_id.clone()))
    }

    fn require_team(&self, project_id: &ProjectId, team_id: &TeamId) -> Result<&Team, SessionError> {
        self.project(project_id)?
            .team(team_id)
            .ok_or_else(|| SessionError::TeamNotFound(team_id.clone()))
    }
}

/// Error raised when a session call names something that is not there.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("project '{0}' not found")]
    ProjectNotFound(ProjectId),
    #[error("criterion '{0}' not found")]
    CriterionNotFound(CriterionId),
    #[error("team '{0}' not found")]
    TeamNotFound(TeamId),
    #[error("no project selected")]
    NoSelection,
    #[error(transparent)]
    Export(#[from] ExportError),
}
