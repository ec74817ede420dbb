//! API endpoint modules.

pub mod credentials;
pub mod documents;
pub mod health;
pub mod intake;
pub mod multipart;
pub mod openapi;
pub mod quality;
pub mod reports;

pub use credentials::configure_routes as configure_credential_routes;
pub use documents::configure_routes as configure_document_routes;
pub use health::configure_health_routes;
pub use intake::configure_routes as configure_intake_routes;
pub use openapi::ApiDoc;
pub use quality::configure_routes as configure_quality_routes;
pub use reports::configure_routes as configure_report_routes;

use actix_web::web;

/// Mount every API route group. Callers wrap this in the `/api/v1` scope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_intake_routes)
        .configure(configure_report_routes)
        .configure(configure_document_routes)
        .configure(configure_credential_routes)
        .configure(configure_quality_routes);
}
