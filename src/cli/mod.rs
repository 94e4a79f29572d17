//! CLI module for the retrieval evaluation engine
//!
//! - `serve`: HTTP API
//! - `evaluate`: run one batch file and print the report

pub mod evaluate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Retrieval strategy evaluation - grid experiments and cross-strategy comparison
#[derive(Parser)]
#[command(name = "retrieval-eval")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Evaluate a batch request file and print the report as JSON
    Evaluate(evaluate::EvaluateArgs),
}
