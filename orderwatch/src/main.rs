use anyhow::Result;
use clap::Parser;

use orderwatch::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    cli::run(Cli::parse()).await
}
