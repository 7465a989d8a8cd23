use crate::demo::{run_demo, run_quick_check, DemoArgs, QuickCheckArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_pipeline::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Pipeline",
    about = "Run the lead lifecycle and eligibility engine, or exercise it from the command line",
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
    /// Score a quick eligibility check without starting the server
    Eligibility(QuickCheckArgs),
    /// Walk sample leads through the pipeline, document queue and lender acceptance
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
        Command::Eligibility(args) => run_quick_check(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
