use clap::Parser;
use retrieval_eval::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Evaluate(args) => cli::evaluate::run(args).await,
    }
}
