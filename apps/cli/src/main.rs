//! nbshelf CLI: keep a local library of your NotebookLM notebooks.
//!
//! Discovers notebooks through a signed-in browser session, stores them
//! in a JSON library and enriches them with a description and topics.

mod commands;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);

    // Dropping the command on Ctrl-C drops any open browser session, which
    // deletes it on the WebDriver endpoint.
    tokio::select! {
        result = commands::run(cli) => result,
        _ = tokio::signal::ctrl_c() => Err(eyre!("interrupted")),
    }
}
