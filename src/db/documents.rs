//! Database queries for uploaded documents.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::entity::document::{self, ActiveModel, Entity as Document};
use crate::error::{AppError, AppResult};

use super::DbPool;

/// Document entry to insert into the database.
#[derive(Debug, Clone)]
pub struct DocumentEntry {
    pub id: Uuid,
    pub report_id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub file_path: String,
    pub extracted_data: Option<JsonValue>,
}

impl DbPool {
    /// Insert a document row.
    pub async fn insert_document(&self, entry: DocumentEntry) -> AppResult<document::Model> {
        let model = ActiveModel {
            id: Set(entry.id),
            report_id: Set(entry.report_id),
            filename: Set(entry.filename),
            mime_type: Set(entry.mime_type),
            size_bytes: Set(entry.size_bytes),
            file_path: Set(entry.file_path),
            extracted_data: Set(entry.extracted_data),
            created_at: Set(Utc::now()),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert document: {}", e)))?;

        Ok(result)
    }

    /// Get a document by ID.
    pub async fn get_document_by_id(&self, id: Uuid) -> AppResult<Option<document::Model>> {
        let result = Document::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get document: {}", e)))?;

        Ok(result)
    }

    /// Get documents for a set of reports, in upload order.
    pub async fn get_documents_by_report_ids(
        &self,
        report_ids: &[Uuid],
    ) -> AppResult<Vec<document::Model>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = Document::find()
            .filter(document::Column::ReportId.is_in(report_ids.to_vec()))
            .order_by_asc(document::Column::CreatedAt)
            .order_by_asc(document::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get documents: {}", e)))?;

        Ok(result)
    }

    /// Get every document in the store.
    pub async fn get_all_documents(&self) -> AppResult<Vec<document::Model>> {
        let result = Document::find()
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get documents: {}", e)))?;

        Ok(result)
    }
}
