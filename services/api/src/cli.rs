use crate::demo::{run_board, run_demo, run_export, BoardArgs, DemoArgs, ExportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use judgeboard::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Judgeboard",
    about = "Score judged competitions, follow the live leaderboard, and export results",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the scoreboard of a stored project
    Board(BoardArgs),
    /// Write a project's leaderboard as CSV
    Export(ExportArgs),
    /// Score a sample robotics event in memory and print the results
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Board(args) => run_board(args),
        Command::Export(args) => run_export(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn export_accepts_project_and_output() {
        let cli = Cli::try_parse_from([
            "judgeboard",
            "export",
            "--project",
            "proj-1",
            "--output",
            "out.csv",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Export(args)) => {
                assert_eq!(args.project.as_deref(), Some("proj-1"));
                assert_eq!(
                    args.output.as_deref(),
                    Some(std::path::Path::new("out.csv"))
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["judgeboard"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
