//! SeaORM entity definitions.

pub mod api_credential;
pub mod document;
pub mod issue;
pub mod report;
