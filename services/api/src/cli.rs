use crate::demo::{run_autofill, run_demo, run_plan, AutoFillArgs, DemoArgs, PlanArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use study_planner::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Study Planner",
    about = "Plan homeschool days and fill weekly schedules from the command line",
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
    /// Populate one day from CSV exports of assignments and the schedule template
    Plan(PlanArgs),
    /// Run the weekly auto-fill against the seeded demo data
    Autofill(AutoFillArgs),
    /// Walk through day planning and weekly auto-fill for the demo students
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
        Command::Plan(args) => run_plan(args),
        Command::Autofill(args) => run_autofill(args),
        Command::Demo(args) => run_demo(args),
    }
}
