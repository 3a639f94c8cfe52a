use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::board::Scoreboard;
use super::domain::{
    lenient_number, Criterion, CriterionId, CriterionPatch, Project, ProjectId, ProjectPatch,
    Team, TeamId,
};
use super::export::EXPORT_CONTENT_TYPE;
use super::session::{CriterionDraft, ScoringSession};
use super::storage::StateStore;
use crate::error::AppError;

/// Session handle shared by every request; transitions apply in arrival order.
pub type SharedSession<S> = Arc<Mutex<ScoringSession<S>>>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub created_at: i64,
    pub criteria: usize,
    pub teams: usize,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            created_at: project.created_at,
            criteria: project.criteria.len(),
            teams: project.teams.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListing {
    pub selected_project_id: Option<ProjectId>,
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Deserialize)]
pub struct TeamDraft {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TeamRename {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoreEntry {
    #[serde(deserialize_with = "lenient_number")]
    pub value: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredScore {
    pub team_id: TeamId,
    pub criterion_id: CriterionId,
    pub value: f64,
}

/// Router builder exposing project, rubric, team, and leaderboard endpoints.
pub fn scoring_router<S>(session: SharedSession<S>) -> Router
where
    S: StateStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/projects",
            get(list_projects::<S>).post(create_project::<S>),
        )
        .route(
            "/api/v1/projects/:project_id",
            patch(update_project::<S>).delete(delete_project::<S>),
        )
        .route(
            "/api/v1/projects/:project_id/select",
            put(select_project::<S>),
        )
        .route(
            "/api/v1/projects/:project_id/criteria",
            post(add_criterion::<S>),
        )
        .route(
            "/api/v1/projects/:project_id/criteria/:criterion_id",
            patch(update_criterion::<S>).delete(remove_criterion::<S>),
        )
        .route("/api/v1/projects/:project_id/teams", post(add_team::<S>))
        .route(
            "/api/v1/projects/:project_id/teams/:team_id",
            patch(rename_team::<S>).delete(remove_team::<S>),
        )
        .route(
            "/api/v1/projects/:project_id/teams/:team_id/scores/:criterion_id",
            put(set_score::<S>),
        )
        .route(
            "/api/v1/projects/:project_id/scoreboard",
            get(scoreboard::<S>),
        )
        .route(
            "/api/v1/projects/:project_id/export",
            get(export_csv::<S>),
        )
        .with_state(session)
}

pub(crate) async fn list_projects<S>(State(session): State<SharedSession<S>>) -> Json<ProjectListing>
where
    S: StateStore + 'static,
{
    let session = session.lock().expect("session mutex poisoned");
    let state = session.state();
    Json(ProjectListing {
        selected_project_id: state.selected_project_id.clone(),
        projects: state.projects.iter().map(ProjectSummary::from).collect(),
    })
}

pub(crate) async fn create_project<S>(State(session): State<SharedSession<S>>) -> Response
where
    S: StateStore + 'static,
{
    let project = session
        .lock()
        .expect("session mutex poisoned")
        .create_project();
    (StatusCode::CREATED, Json(project)).into_response()
}

pub(crate) async fn update_project<S>(
    State(session): State<SharedSession<S>>,
    Path(project_id): Path<String>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<Project>, AppError>
where
    S: StateStore + 'static,
{
    let mut session = session.lock().expect("session mutex poisoned");
    let project = session.update_project(&ProjectId(project_id), patch)?;
    Ok(Json(project.clone()))
}

pub(crate) async fn delete_project<S>(
    State(session): State<SharedSession<S>>,
    Path(project_id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: StateStore + 'static,
{
    let mut session = session.lock().expect("session mutex poisoned");
    session.delete_project(&ProjectId(project_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn select_project<S>(
    State(session): State<SharedSession<S>>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectSummary>, AppError>
where
    S: StateStore + 'static,
{
    let mut session = session.lock().expect("session mutex poisoned");
    let project = session.select_project(&ProjectId(project_id))?;
    Ok(Json(ProjectSummary::from(project)))
}

pub(crate) async fn add_criterion<S>(
    State(session): State<SharedSession<S>>,
    Path(project_id): Path<String>,
    Json(draft): Json<CriterionDraft>,
) -> Result<(StatusCode, Json<Criterion>), AppError>
where
    S: StateStore + 'static,
{
    let mut session = session.lock().expect("session mutex poisoned");
    let criterion = session.add_criterion(&ProjectId(project_id), draft)?;
    Ok((StatusCode::CREATED, Json(criterion)))
}

pub(crate) async fn update_criterion<S>(
    State(session): State<SharedSession<S>>,
    Path((project_id, criterion_id)): Path<(String, String)>,
    Json(patch): Json<CriterionPatch>,
) -> Result<Json<Criterion>, AppError>
where
    S: StateStore + 'static,
{
    let mut session = session.lock().expect("session mutex poisoned");
    let criterion = session.update_criterion(
        &ProjectId(project_id),
        &CriterionId(criterion_id),
        patch,
    )?;
    Ok(Json(criterion))
}

pub(crate) async fn remove_criterion<S>(
    State(session): State<SharedSession<S>>,
    Path((project_id, criterion_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError>
where
    S: StateStore + 'static,
{
    let mut session = session.lock().expect("session mutex poisoned");
    session.remove_criterion(&ProjectId(project_id), &CriterionId(criterion_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn add_team<S>(
    State(session): State<SharedSession<S>>,
    Path(project_id): Path<String>,
    Json(draft): Json<TeamDraft>,
) -> Result<(StatusCode, Json<Team>), AppError>
where
    S: StateStore + 'static,
{
    let mut session = session.lock().expect("session mutex poisoned");
    let team = session.add_team(&ProjectId(project_id), draft.name)?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub(crate) async fn rename_team<S>(
    State(session): State<SharedSession<S>>,
    Path((project_id, team_id)): Path<(String, String)>,
    Json(rename): Json<TeamRename>,
) -> Result<Json<Team>, AppError>
where
    S: StateStore + 'static,
{
    let mut session = session.lock().expect("session mutex poisoned");
    let team = session.rename_team(&ProjectId(project_id), &TeamId(team_id), rename.name)?;
    Ok(Json(team))
}

pub(crate) async fn remove_team<S>(
    State(session): State<SharedSession<S>>,
    Path((project_id, team_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError>
where
    S: StateStore + 'static,
{
    let mut session = session.lock().expect("session mutex poisoned");
    session.remove_team(&ProjectId(project_id), &TeamId(team_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn set_score<S>(
    State(session): State<SharedSession<S>>,
    Path((project_id, team_id, criterion_id)): Path<(String, String, String)>,
    Json(entry): Json<ScoreEntry>,
) -> Result<Json<StoredScore>, AppError>
where
    S: StateStore + 'static,
{
    let team_id = TeamId(team_id);
    let criterion_id = CriterionId(criterion_id);
    let mut session = session.lock().expect("session mutex poisoned");
    let value = session.set_score(&ProjectId(project_id), &team_id, &criterion_id, entry.value)?;
    Ok(Json(StoredScore {
        team_id,
        criterion_id,
        value,
    }))
}

pub(crate) async fn scoreboard<S>(
    State(session): State<SharedSession<S>>,
    Path(project_id): Path<String>,
) -> Result<Json<Scoreboard>, AppError>
where
    S: StateStore + 'static,
{
    let session = session.lock().expect("session mutex poisoned");
    let board = session.scoreboard(&ProjectId(project_id))?;
    Ok(Json(board))
}

pub(crate) async fn export_csv<S>(
    State(session): State<SharedSession<S>>,
    Path(project_id): Path<String>,
) -> Result<Response, AppError>
where
    S: StateStore + 'static,
{
    let export = session
        .lock()
        .expect("session mutex poisoned")
        .export(&ProjectId(project_id))?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe_file_name(&export.file_name)
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, EXPORT_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response())
}

/// Header values must be visible ASCII; anything else becomes `_`.
fn header_safe_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_graphic() && ch != '"' && ch != '\\' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
