//! Creates carousel ads in static-image ad groups from `image_url` lists.

use rust_tiktok_creatives::pipeline::RunMode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rust_tiktok_creatives::runner::run(RunMode::Image).await
}
