use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::scoring::container::AppState;
use crate::scoring::domain::{Criterion, CriterionId, Project, ProjectId, Team, TeamId};
use crate::scoring::router::{scoring_router, SharedSession};
use crate::scoring::session::ScoringSession;
use crate::scoring::storage::{MemoryStore, StateStore, StoreError};

pub(super) const STORAGE_KEY: &str = "judgeboard-test";

pub(super) fn criterion(id: &str, name: &str, weight: f64, max: f64) -> Criterion {
    Criterion {
        id: CriterionId(id.to_string()),
        name: name.to_string(),
        weight,
        max,
    }
}

pub(super) fn team(id: &str, name: &str, scores: &[(&str, f64)]) -> Team {
    Team {
        id: TeamId(id.to_string()),
        name: name.to_string(),
        scores: scores
            .iter()
            .map(|(criterion, raw)| (CriterionId(criterion.to_string()), *raw))
            .collect(),
    }
}

/// Two-criterion robotics project with a pair of partially judged teams.
pub(super) fn robotics_project(id: &str) -> Project {
    Project {
        id: ProjectId(id.to_string()),
        name: "Robotics Finals".to_string(),
        created_at: 1_700_000_000_000,
        criteria: vec![
            criterion("impact", "Impact", 20.0, 10.0),
            criterion("creativity", "Creativity", 20.0, 10.0),
        ],
        teams: vec![
            team("beta", "Beta", &[("impact", 8.0), ("creativity", 5.0)]),
            team("alpha", "Alpha", &[("impact", 5.0), ("creativity", 8.0)]),
        ],
    }
}

pub(super) fn state_with(projects: Vec<Project>) -> AppState {
    let selected_project_id = projects.first().map(|project| project.id.clone());
    AppState {
        projects,
        selected_project_id,
    }
}

pub(super) fn pid(id: &str) -> ProjectId {
    ProjectId(id.to_string())
}

pub(super) fn memory_session(state: AppState) -> (ScoringSession<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let session = ScoringSession::with_state(store.clone(), STORAGE_KEY, state);
    (session, store)
}

pub(super) fn shared_router(state: AppState) -> (axum::Router, SharedSession<MemoryStore>) {
    let (session, _store) = memory_session(state);
    let shared = Arc::new(Mutex::new(session));
    (scoring_router(shared.clone()), shared)
}

/// Store whose disk is always full.
#[derive(Default)]
pub(super) struct UnavailableStore;

impl StateStore for UnavailableStore {
    fn load(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }

    fn save(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
