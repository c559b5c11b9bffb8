use crate::demo::{print_templates, run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use grantthrive::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "GrantThrive",
    about = "Run the GrantThrive grant management service from the command line",
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
    /// Walk a grant through publish, apply, review and archive against an in-memory store
    Demo(DemoArgs),
    /// Print the feature catalog and compliance templates
    Templates,
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
        Command::Demo(args) => run_demo(args),
        Command::Templates => {
            print_templates();
            Ok(())
        }
    }
}
