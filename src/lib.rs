// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod http;
pub mod metrics;
pub mod scheduler;
pub mod state;
pub mod summary;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::DashboardError;
pub use crate::feed::types::TrendEntry;
pub use crate::state::{DashboardSnapshot, DashboardState};
