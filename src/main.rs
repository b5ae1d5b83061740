use anyhow::Result;
use profrag::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
