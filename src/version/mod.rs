//! Release version layer
//!
//! This module fetches release versions of the tracked languages, decides
//! which one is "latest" and which one is "stable", and keeps them in a JSON
//! cache.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registries │────▶│   Fetcher   │────▶│    Cache    │
//! │   (HTTP)    │     │ (tags→info) │     │   (JSON)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │    Feeds    │     │  Languages  │
//! │ (downloads) │     │ + Stability │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: JSON version cache with freshness checks and merging
//! - [`error`]: Error types for parsing, fetching and cache writes
//! - [`feeds`]: Official per-language release feeds
//! - [`fetcher`]: `VersionFetcher` trait and the GitHub-tag fetcher
//! - [`languages`]: Per-language stable-tag rules and tag parsing
//! - [`normalize`]: Version string and date normalization
//! - [`registries`]: HTTP clients for GitHub and the download sites
//! - [`semver`]: Version sort keys and comparison
//! - [`stability`]: Latest/stable selection
//! - [`types`]: Common types like `Language` and `VersionInfo`

pub mod cache;
pub mod error;
pub mod feeds;
pub mod fetcher;
pub mod languages;
pub mod normalize;
pub mod registries;
pub mod semver;
pub mod stability;
pub mod types;
