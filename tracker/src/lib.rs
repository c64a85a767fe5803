//! HTTP service for the DAI balance tracker
//!
//! Serves the wallet collection, triggers syncs and bulk registrations,
//! and exposes the RPC endpoint override and a narrative summary.

pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod summary;

pub use config::TrackerConfig;
pub use error::ApiError;
pub use state::AppState;
pub use summary::SummaryClient;
