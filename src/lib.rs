#![forbid(unsafe_code)]

//! Video discovery backend for tubefeed.
//!
//! The crate turns search, video and channel requests into calls against the
//! YouTube Data API. Channel video lists change slowly and cost quota, so they
//! are served from a snapshot cache with a freshness window; search, video
//! details and trending always go to the provider.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod models;
pub mod params;
pub mod provider;
pub mod response;
pub mod snapshot_store;
pub mod youtube;

#[cfg(test)]
mod testing;
