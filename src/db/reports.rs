//! Database queries for reports.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::document::{self, Entity as Document};
use crate::entity::issue::{self, Entity as Issue};
use crate::entity::report::{self, ActiveModel, Entity as Report};
use crate::error::{AppError, AppResult};
use crate::models::{ListReportsQuery, ReportAggregate, ReportStatus};

use super::DbPool;

/// A report with its eagerly loaded children.
#[derive(Debug, Clone)]
pub struct ReportWithChildren {
    pub report: report::Model,
    pub documents: Vec<document::Model>,
    /// Newest first.
    pub issues: Vec<issue::Model>,
}

impl DbPool {
    /// Insert a new report in PENDING status.
    pub async fn insert_report(&self, id: Uuid, name: &str) -> AppResult<report::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            status: Set(ReportStatus::Pending.as_str().to_string()),
            total_amount: Set(None),
            confidence: Set(0.0),
            summary: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert report: {}", e)))?;

        Ok(result)
    }

    /// Get a report by ID.
    pub async fn get_report_by_id(&self, id: Uuid) -> AppResult<Option<report::Model>> {
        let result = Report::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get report: {}", e)))?;

        Ok(result)
    }

    /// Get a report with its documents and issues.
    pub async fn get_report_with_children(
        &self,
        id: Uuid,
    ) -> AppResult<Option<ReportWithChildren>> {
        let Some(report) = self.get_report_by_id(id).await? else {
            return Ok(None);
        };

        let documents = self.get_documents_by_report_ids(&[id]).await?;
        let issues = self.get_issues_by_report_ids(&[id]).await?;

        Ok(Some(ReportWithChildren {
            report,
            documents,
            issues,
        }))
    }

    /// Update report status, enforcing the workflow state machine.
    pub async fn update_report_status(
        &self,
        id: Uuid,
        status: ReportStatus,
    ) -> AppResult<report::Model> {
        let report = self
            .get_report_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

        let current = ReportStatus::parse(&report.status).unwrap_or(ReportStatus::Pending);
        if !current.can_transition_to(status) {
            return Err(AppError::InvalidInput(format!(
                "Report {} cannot move from {} to {}",
                id, current, status
            )));
        }

        let mut active: ActiveModel = report.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update report status: {}", e)))?;

        Ok(result)
    }

    /// Write aggregated analysis results to a report.
    pub async fn update_report_aggregate(
        &self,
        id: Uuid,
        aggregate: &ReportAggregate,
    ) -> AppResult<report::Model> {
        let report = self
            .get_report_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

        let mut active: ActiveModel = report.into();
        active.name = Set(aggregate.name.clone());
        active.total_amount = Set(aggregate.total_amount);
        active.confidence = Set(aggregate.confidence);
        active.summary = Set(Some(aggregate.summary.clone()));
        active.updated_at = Set(Utc::now());

        let result = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update report: {}", e)))?;

        Ok(result)
    }

    /// List reports with their documents and issues, newest first.
    pub async fn list_reports_with_children(
        &self,
        query: &ListReportsQuery,
    ) -> AppResult<(Vec<ReportWithChildren>, u64)> {
        let mut select = Report::find();

        if let Some(ref status) = query.status {
            select = select.filter(report::Column::Status.eq(status.as_str()));
        }

        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count reports: {}", e)))?;

        let mut select = select.order_by_desc(report::Column::CreatedAt);
        if let Some(offset) = query.offset {
            select = select.offset(offset);
        }
        if let Some(limit) = query.limit {
            select = select.limit(limit.max(1));
        }

        let reports = select
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list reports: {}", e)))?;

        // Batch fetch children for every listed report
        let report_ids: Vec<Uuid> = reports.iter().map(|r| r.id).collect();
        let mut documents_map: HashMap<Uuid, Vec<document::Model>> = HashMap::new();
        for doc in self.get_documents_by_report_ids(&report_ids).await? {
            documents_map.entry(doc.report_id).or_default().push(doc);
        }
        let mut issues_map: HashMap<Uuid, Vec<issue::Model>> = HashMap::new();
        for issue in self.get_issues_by_report_ids(&report_ids).await? {
            issues_map.entry(issue.report_id).or_default().push(issue);
        }

        let results = reports
            .into_iter()
            .map(|report| ReportWithChildren {
                documents: documents_map.remove(&report.id).unwrap_or_default(),
                issues: issues_map.remove(&report.id).unwrap_or_default(),
                report,
            })
            .collect();

        Ok((results, total))
    }

    /// Delete a report and its child rows.
    ///
    /// Returns the number of report rows removed (0 or 1).
    pub async fn delete_report(&self, id: Uuid) -> AppResult<u64> {
        let txn = self.connection().begin().await?;

        // Children are removed explicitly as well as by the ON DELETE CASCADE
        // so backends with foreign keys disabled behave the same.
        Issue::delete_many()
            .filter(issue::Column::ReportId.eq(id))
            .exec(&txn)
            .await?;
        Document::delete_many()
            .filter(document::Column::ReportId.eq(id))
            .exec(&txn)
            .await?;
        let result = Report::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected)
    }

    /// Truncate the report, document, and issue tables.
    ///
    /// Returns the number of report rows removed.
    pub async fn delete_all_reports(&self) -> AppResult<u64> {
        let txn = self.connection().begin().await?;

        Issue::delete_many().exec(&txn).await?;
        Document::delete_many().exec(&txn).await?;
        let result = Report::delete_many().exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected)
    }
}
