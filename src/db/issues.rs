//! Database queries for compliance issues.

use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::issue::{self, ActiveModel, Entity as Issue};
use crate::error::{AppError, AppResult};
use crate::services::compliance::ComplianceIssue;

use super::DbPool;

impl DbPool {
    /// Insert the issues found for one document in a batch.
    pub async fn insert_issues(
        &self,
        report_id: Uuid,
        issues: &[ComplianceIssue],
    ) -> AppResult<Vec<issue::Model>> {
        if issues.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let ids: Vec<Uuid> = issues.iter().map(|_| Uuid::now_v7()).collect();
        let models: Vec<ActiveModel> = issues
            .iter()
            .zip(&ids)
            .map(|(found, id)| ActiveModel {
                id: Set(*id),
                report_id: Set(report_id),
                severity: Set(found.severity.as_str().to_string()),
                title: Set(found.title.clone()),
                description: Set(found.description.clone()),
                recommendation: Set(found.recommendation.clone()),
                confidence: Set(found.confidence),
                severity_weight: Set(found.severity.weight()),
                location: Set(found.location.clone()),
                resolved: Set(false),
                created_at: Set(now),
            })
            .collect();

        Issue::insert_many(models)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert issues: {}", e)))?;

        let inserted = Issue::find()
            .filter(issue::Column::Id.is_in(ids))
            .order_by_asc(issue::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to read inserted issues: {}", e)))?;

        Ok(inserted)
    }

    /// Get issues for a set of reports, newest first.
    pub async fn get_issues_by_report_ids(
        &self,
        report_ids: &[Uuid],
    ) -> AppResult<Vec<issue::Model>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = Issue::find()
            .filter(issue::Column::ReportId.is_in(report_ids.to_vec()))
            .order_by_desc(issue::Column::CreatedAt)
            .order_by_desc(issue::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get issues: {}", e)))?;

        Ok(result)
    }
}
