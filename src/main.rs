//! Creates video ads from the `video_url` column of the input CSV.

use rust_tiktok_creatives::pipeline::RunMode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rust_tiktok_creatives::runner::run(RunMode::Video).await
}
