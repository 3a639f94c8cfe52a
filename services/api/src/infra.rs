use chrono::{TimeZone, Utc};
use judgeboard::config::StorageConfig;
use judgeboard::scoring::{
    FileStore, Project, ProjectId, ScoringSession, SessionError, SharedSession, StateStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Opens the judging session stored under the configured data directory.
pub(crate) fn open_file_session(storage: &StorageConfig) -> ScoringSession<FileStore> {
    let store = Arc::new(FileStore::new(storage.data_dir.clone()));
    info!(
        data_dir = %storage.data_dir.display(),
        key = %storage.key,
        "opening judging state"
    );
    ScoringSession::open(store, storage.key.clone())
}

pub(crate) fn share<S>(session: ScoringSession<S>) -> SharedSession<S>
where
    S: StateStore + 'static,
{
    Arc::new(Mutex::new(session))
}

/// The named project, or the selected one when no id is given.
pub(crate) fn resolve_project<'a, S>(
    session: &'a ScoringSession<S>,
    project_id: Option<&str>,
) -> Result<&'a Project, SessionError>
where
    S: StateStore + 'static,
{
    match project_id {
        Some(id) => session.project(&ProjectId(id.to_string())),
        None => session.selected(),
    }
}

/// `createdAt` milliseconds as a UTC date for display.
pub(crate) fn format_created_at(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|created| created.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}
