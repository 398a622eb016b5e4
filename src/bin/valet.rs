use anyhow::Result;
use valet::cli::start;

#[tokio::main]
async fn main() -> Result<()> {
    start()?.execute().await
}
