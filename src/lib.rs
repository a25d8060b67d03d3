//! TikTok creative automation library
//!
//! Uploads media to the TikTok Business API, finds the ad groups each asset
//! belongs to, and either creates a new ad (standard groups) or appends the
//! video to the group's smart-creative media list (adaptive groups).
//! Every outcome is written to a CSV report.
//!
//! # Modules
//!
//! - `core`: Domain logic (models, naming conventions, creative building).
//! - `integrations`: TikTok Business API access.
//! - `ad_group_name`: Tags parsed from ad-group naming conventions.
//! - `ad_group_resolver`: Ad-group lookup and sibling-ad attributes.
//! - `config`: Configuration management.
//! - `creative_builder`: `ad/create` creative payloads.
//! - `dispatcher`: Ad creation in standard groups.
//! - `errors`: Error handling types.
//! - `gateway_client`: Rate-limited TikTok API client.
//! - `input`: CSV input rows.
//! - `media`: Media download, upload and cover suggestions.
//! - `models`: Core data models.
//! - `pipeline`: Run modes.
//! - `rate_limiter`: Per-endpoint token buckets.
//! - `report`: CSV processing reports.
//! - `runner`: Binary entry point.
//! - `smart_creative`: Smart-creative media list updates.
//! - `tiktok_models`: Platform wire types.

pub mod core;
pub mod integrations;

pub mod ad_group_name;
pub mod ad_group_resolver;
pub mod config;
pub mod creative_builder;
pub mod dispatcher;
pub mod errors;
pub mod gateway_client;
pub mod input;
pub mod media;
pub mod models;
pub mod pipeline;
pub mod rate_limiter;
pub mod report;
pub mod runner;
pub mod smart_creative;
pub mod tiktok_models;
