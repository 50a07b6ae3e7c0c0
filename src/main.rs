mod bus;
mod cli;
mod config;
mod console;
mod error;
mod host;
mod logging;
mod model;
mod orchestrator;
mod storage;
#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;

// Signal handlers run one at a time on a single thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init_logging();

    cli::run(args).await
}
