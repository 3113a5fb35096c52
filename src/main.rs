//! Flowscope - market flow analytics CLI
//!
//! Fits regression channels and composes contextual alerts from a market snapshot.

use anyhow::Result;
use flowscope::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (FLOWSCOPE_LOG may live there)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
