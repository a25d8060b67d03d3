//! Creates ads from TikTok One materials (`material_id`, `category`, `language`).

use rust_tiktok_creatives::pipeline::RunMode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rust_tiktok_creatives::runner::run(RunMode::TiktokOne).await
}
