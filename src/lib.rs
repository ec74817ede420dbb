//! Akuit server library.
//!
//! Upload acquittal documents, extract their contents with a vision model,
//! check them for compliance issues, and keep the results as reports.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
pub mod state;

pub use state::AppState;
