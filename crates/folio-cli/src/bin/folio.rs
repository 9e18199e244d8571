use anyhow::Result;
use clap::Parser;
use folio_cli::{cli::FolioArgs, commands::run, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    run(FolioArgs::parse()).await
}
