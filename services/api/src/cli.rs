use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use mod_intake::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "mod-intake",
    about = "Run the moderator application service or walk through its lifecycle",
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
    /// Submit, review, resubmit, and delete an application against an in-memory store
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
        Command::Demo(args) => run_demo(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_flags_parse() {
        let cli = Cli::try_parse_from(["mod-intake", "demo", "--applicant", "B#2", "--age", "31"])
            .expect("arguments parse");
        match cli.command {
            Some(Command::Demo(args)) => {
                assert_eq!(args.applicant, "B#2");
                assert_eq!(args.age, 31);
                assert!(!args.show_webhook);
            }
            other => panic!("expected demo command, got {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["mod-intake"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
