//! Re-delivers uploaded videos to the ad groups a previous run failed on.

use rust_tiktok_creatives::pipeline::RunMode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rust_tiktok_creatives::runner::run(RunMode::Retry).await
}
