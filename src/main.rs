use std::env::var;

use clap::Parser;
use miette::Result;
use relog::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    if var("RUST_LOG").is_ok() {
        env_logger::init();
    }
    relog::run(Cli::parse()).await?;
    Ok(())
}
