use crate::report::{run_assessment, run_evaluate, run_history, run_project};
use crate::report::{EvaluateArgs, HistoryArgs, ProjectArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use political_risk::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "US Political Risk Framework",
    about = "Serve and explore the US political risk assessment from the command line",
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
    /// Print the current assessment with domain and category scores
    Assessment(DataArgs),
    /// Project predefined scenario events against the current assessment
    Project(ProjectArgs),
    /// Estimate category impacts for a free-text event description
    Evaluate(EvaluateArgs),
    /// Print historical snapshots and period-over-period changes
    History(HistoryArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct DataArgs {
    /// Directory holding current.json and the optional dataset files
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Assessment(args) => run_assessment(args),
        Command::Project(args) => run_project(args),
        Command::Evaluate(args) => run_evaluate(args).await,
        Command::History(args) => run_history(args),
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
    fn project_accepts_repeated_events() {
        let cli = Cli::try_parse_from([
            "political-risk-api",
            "project",
            "--event",
            "tariff-escalation",
            "--event",
            "government-shutdown",
            "--data-dir",
            "fixtures",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Project(args)) => {
                assert_eq!(args.events.len(), 2);
                assert_eq!(args.data.data_dir, Some(PathBuf::from("fixtures")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
