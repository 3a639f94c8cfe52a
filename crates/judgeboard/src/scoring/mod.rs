//! Weighted judging: rubric and team data, the scoring engine, standings,
//! completeness tracking, and the persisted project container around them.

pub mod board;
pub mod container;
pub mod domain;
pub mod engine;
pub mod export;
pub mod progress;
pub mod ranking;
pub mod router;
pub mod session;
pub mod storage;

#[cfg(test)]
mod tests;

pub use board::{Scoreboard, PODIUM_SIZE};
pub use container::{Action, AppState, DEFAULT_PROJECT_NAME, NEW_PROJECT_NAME};
pub use domain::{
    Criterion, CriterionId, CriterionPatch, Project, ProjectId, ProjectPatch, Team, TeamId,
};
pub use engine::{contribution, total, total_weight, weight_balanced, ScoreBreakdown};
pub use export::{export_file_name, export_project, leaderboard_csv, CsvExport, ExportError};
pub use progress::{progress, Progress};
pub use ranking::{rank_teams, RankedTeam, Ranking};
pub use router::{scoring_router, SharedSession};
pub use session::{CriterionDraft, ScoringSession, SessionError};
pub use storage::{FileStore, MemoryStore, StateStore, StoreError, DEFAULT_STORAGE_KEY};
