//! Shared integration test utilities

#![allow(dead_code)]

mod cache;
mod fetcher;

pub use cache::{cache_file_with, language_entry, naive_timestamp};
pub use fetcher::StubFetcher;
