use crate::infra::{format_created_at, open_file_session, resolve_project};
use clap::Args;
use judgeboard::config::AppConfig;
use judgeboard::error::AppError;
use judgeboard::scoring::domain::now_millis;
use judgeboard::scoring::{
    AppState, MemoryStore, Project, Scoreboard, ScoringSession, DEFAULT_STORAGE_KEY,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct BoardArgs {
    /// Project id to show (defaults to the selected project)
    #[arg(long)]
    pub(crate) project: Option<String>,
    /// Print the scoreboard as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Project id to export (defaults to the selected project)
    #[arg(long)]
    pub(crate) project: Option<String>,
    /// Destination file (defaults to `<project-name>-scores.csv` in the working directory)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip printing the CSV export at the end of the demo
    #[arg(long)]
    pub(crate) skip_export: bool,
}

pub(crate) fn run_board(args: BoardArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let session = open_file_session(&config.storage);
    let project = resolve_project(&session, args.project.as_deref())?;
    let board = Scoreboard::build(project);

    if args.json {
        let rendered = serde_json::to_string_pretty(&board).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        print!("{}", render_board(&board, project.created_at));
    }
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let session = open_file_session(&config.storage);
    let project = resolve_project(&session, args.project.as_deref())?;
    let export = session.export(&project.id)?;

    let destination = args
        .output
        .unwrap_or_else(|| PathBuf::from(&export.file_name));
    std::fs::write(&destination, &export.body)?;
    println!(
        "Wrote {} team(s) from '{}' to {}",
        project.teams.len(),
        project.name,
        destination.display()
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let session = score_sample_event()?;
    let project = session.selected()?;

    println!("Judgeboard demo");
    print!(
        "{}",
        render_board(&Scoreboard::build(project), project.created_at)
    );

    if !args.skip_export {
        let export = session.export(&project.id)?;
        println!("\n{}:", export.file_name);
        println!("{}", export.body);
    }
    Ok(())
}

/// Sample event: the seeded showcase fully judged for two teams and a third
/// team that judges have only partly scored.
pub(crate) fn score_sample_event() -> Result<ScoringSession<MemoryStore>, AppError> {
    let alpha = [8.0, 7.0, 6.0, 9.0, 8.0, 7.0];
    let beta = [9.0, 6.0, 8.0, 7.0, 9.0, 6.0];
    let partial = [7.0, 9.0, 9.0];

    let store = Arc::new(MemoryStore::default());
    let mut session = ScoringSession::with_state(
        store,
        DEFAULT_STORAGE_KEY,
        AppState::seeded(now_millis()),
    );

    let project: Project = session.selected()?.clone();
    let gamma = session.add_team(&project.id, Some("Team Gamma".to_string()))?;

    let sheets = project
        .teams
        .iter()
        .map(|team| team.id.clone())
        .zip([&alpha[..], &beta[..]])
        .chain(std::iter::once((gamma.id, &partial[..])));

    for (team_id, raws) in sheets {
        for (criterion, raw) in project.criteria.iter().zip(raws) {
            session.set_score(&project.id, &team_id, &criterion.id, *raw)?;
        }
    }

    Ok(session)
}

pub(crate) fn render_board(board: &Scoreboard, created_at: i64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} (created {})",
        board.project_name,
        format_created_at(created_at)
    );

    if board.weight_balanced {
        let _ = writeln!(out, "Criteria weight: {:.2}%", board.total_weight);
    } else {
        let _ = writeln!(
            out,
            "Criteria weight: {:.2}% (does not add up to 100%)",
            board.total_weight
        );
    }

    match &board.leader {
        Some(leader) => {
            let _ = writeln!(out, "Leader: {}", leader.headline());
        }
        None => {
            let _ = writeln!(out, "Leader: no teams yet");
        }
    }

    let _ = writeln!(
        out,
        "Progress: {}/{} cells ({}%)",
        board.progress.filled, board.progress.total_cells, board.progress.percent
    );

    if board.standings.is_empty() {
        return out;
    }

    let _ = writeln!(out, "\nRank  {:<24}  Total %", "Team");
    for entry in &board.standings {
        let _ = writeln!(
            out,
            "{:>4}  {:<24}  {:>7.2}",
            entry.rank, entry.name, entry.total
        );
    }
    out
}
