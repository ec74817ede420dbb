//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::config::MODEL_API_KEY_HEADER;
use crate::{api, error, models, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Akuit",
        version = "0.3.0",
        description = "Upload acquittal documents and analyze them for compliance issues with a vision model"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Intake
        api::intake::upload_documents,
        // Report endpoints
        api::reports::list_reports,
        api::reports::get_report,
        api::reports::export_report_csv,
        api::reports::delete_report_handler,
        api::reports::clear_reports,
        // Documents
        api::documents::document_file,
        // Credentials
        api::credentials::list_credentials,
        api::credentials::create_credential,
        api::credentials::activate_credential,
        api::credentials::delete_credential,
        // Quality
        api::quality::analyze_quality,
        api::quality::enhance_image,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Intake
            models::IntakeResponse,
            models::FailedFile,
            // Reports
            models::ReportStatus,
            models::ReportResponse,
            models::ReportListResponse,
            models::ReportDetailResponse,
            models::ListReportsQuery,
            models::DeleteResponse,
            models::DocumentResponse,
            models::IssueResponse,
            models::Severity,
            // Credentials
            services::Provider,
            models::CreateCredentialRequest,
            models::CredentialResponse,
            models::CredentialListResponse,
            models::CredentialEnvelope,
            // Quality
            api::quality::QualityResponse,
            services::quality::QualityReport,
            services::quality::QualityMetrics,
            services::quality::QualityTier,
            services::quality::DocumentKind,
            services::quality::DocumentTypeGuess,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Intake", description = "Document upload and analysis"),
        (name = "Reports", description = "Analyzed reports"),
        (name = "Documents", description = "Uploaded document files"),
        (name = "Credentials", description = "Stored model provider credentials"),
        (name = "Quality", description = "Image quality heuristics")
    ),
    modifiers(&ModelKeyAddon)
)]
pub struct ApiDoc;

/// Document the optional model credential header.
struct ModelKeyAddon;

impl utoipa::Modify for ModelKeyAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "model_api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(MODEL_API_KEY_HEADER),
                    ),
                ),
            );
        }
    }
}
