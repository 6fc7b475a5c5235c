//! Flapjack CLI - convert automaton documents and interpret graphs
//!
//! Provides a `convert` subcommand translating a source automaton document
//! into a typed graph document, and an `interp` subcommand evaluating a
//! graph against input strings via a named plugin.

use anyhow::Context;
use clap::{Parser, Subcommand};
use flapjack::pipeline::{self, RunStatus};
use flapjack::{convert, plugin};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flapjack")]
#[command(about = "Automaton document converter and interpreter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a source automaton document into a graph document
    Convert {
        /// Plugin to convert for (turing-machine, dfa, nfa)
        plugin: String,

        /// Source automaton document to read
        source: PathBuf,

        /// Graph document to write
        destination: PathBuf,
    },

    /// Interpret a graph document against input strings
    Interp {
        /// Plugin to interpret with (turing-machine, dfa, nfa)
        plugin: String,

        /// Graph document to interpret
        graph: PathBuf,

        /// Input strings to run, in order
        inputs: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            plugin,
            source,
            destination,
        } => {
            let plugin = plugin::load(&plugin)?;
            convert::convert_file(&*plugin, &source, &destination)
                .await
                .context("conversion failed")?;
            println!("Wrote {}", destination.display());
        }

        Commands::Interp {
            plugin,
            graph,
            inputs,
        } => {
            let plugin = plugin::load(&plugin)?;
            let report = pipeline::interpret(&*plugin, &graph, &inputs)
                .await
                .context("interpretation failed")?;

            // Validation failure: one message, no runs.
            if let Some(message) = report.validation {
                eprintln!("Could not compile {}: {}", graph.display(), message);
                return Ok(());
            }

            for record in report.runs {
                match record.status {
                    RunStatus::Output(value) => println!("{}", value),
                    RunStatus::Failed(value) => eprintln!("ERROR: {}", value),
                }
            }
        }
    }

    Ok(())
}
