//! SpeakerScout CLI: shortlist conference speakers from a batch of profiles.
//!
//! Runs the nine-stage filtering pipeline over a JSON export and writes the
//! annotated shortlist, with an optional top-quartile ranking.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
