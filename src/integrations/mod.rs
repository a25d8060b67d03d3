//! TikTok Business API integration.

pub mod gateway_client {
    pub use crate::gateway_client::*;
}

pub mod rate_limiter {
    pub use crate::rate_limiter::*;
}

pub mod tiktok_models {
    pub use crate::tiktok_models::*;
}

pub mod media {
    pub use crate::media::*;
}
