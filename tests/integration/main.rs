//! End-to-end API tests.
//!
//! Every test gets its own in-memory SQLite database, a temporary upload
//! directory and a scripted model gateway, so no network access is needed.
//!
//! Run with: cargo test --test integration

mod helpers;

mod test_credentials;
mod test_gateway;
mod test_intake;
mod test_quality;
mod test_reports;
