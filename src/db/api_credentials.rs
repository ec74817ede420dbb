//! Database queries for stored model provider credentials.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::entity::api_credential::{self, ActiveModel, Entity as ApiCredential};
use crate::error::{AppError, AppResult};

use super::DbPool;

impl DbPool {
    /// Insert an encrypted credential, optionally making it the active one.
    pub async fn insert_api_credential(
        &self,
        provider: &str,
        label: &str,
        encrypted_secret: &str,
        is_valid: Option<bool>,
        activate: bool,
    ) -> AppResult<api_credential::Model> {
        let txn = self.connection().begin().await?;

        if activate {
            ApiCredential::update_many()
                .col_expr(api_credential::Column::IsActive, Expr::value(false))
                .exec(&txn)
                .await?;
        }

        let model = ActiveModel {
            id: Set(Uuid::now_v7()),
            provider: Set(provider.to_string()),
            label: Set(label.to_string()),
            encrypted_secret: Set(encrypted_secret.to_string()),
            is_active: Set(activate),
            is_valid: Set(is_valid),
            created_at: Set(Utc::now()),
            last_used_at: Set(None),
        };

        let result = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert credential: {}", e)))?;

        txn.commit().await?;

        Ok(result)
    }

    /// List stored credentials, newest first.
    pub async fn list_api_credentials(&self) -> AppResult<Vec<api_credential::Model>> {
        let result = ApiCredential::find()
            .order_by_desc(api_credential::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list credentials: {}", e)))?;

        Ok(result)
    }

    /// Get the active credential, if one is marked active.
    pub async fn get_active_api_credential(&self) -> AppResult<Option<api_credential::Model>> {
        let result = ApiCredential::find()
            .filter(api_credential::Column::IsActive.eq(true))
            .order_by_desc(api_credential::Column::CreatedAt)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get active credential: {}", e)))?;

        Ok(result)
    }

    /// Make a credential the only active one.
    pub async fn activate_api_credential(&self, id: Uuid) -> AppResult<api_credential::Model> {
        let txn = self.connection().begin().await?;

        let credential = ApiCredential::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Credential {}", id)))?;

        ApiCredential::update_many()
            .col_expr(api_credential::Column::IsActive, Expr::value(false))
            .exec(&txn)
            .await?;

        let mut active: ActiveModel = credential.into();
        active.is_active = Set(true);
        let result = active.update(&txn).await?;

        txn.commit().await?;

        Ok(result)
    }

    /// Record that a credential was just used for a model call.
    pub async fn touch_api_credential(&self, id: Uuid) -> AppResult<()> {
        ApiCredential::update_many()
            .col_expr(api_credential::Column::LastUsedAt, Expr::value(Utc::now()))
            .filter(api_credential::Column::Id.eq(id))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update credential: {}", e)))?;

        Ok(())
    }

    /// Delete a credential by ID.
    pub async fn delete_api_credential(&self, id: Uuid) -> AppResult<bool> {
        let result = ApiCredential::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete credential: {}", e)))?;

        Ok(result.rows_affected > 0)
    }
}
