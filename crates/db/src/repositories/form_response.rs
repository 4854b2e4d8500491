//! Form response repository.

use std::sync::Arc;

use collexo_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};

use super::form::increment_if_below_ceiling;
use crate::entities::{FormResponse, SocietyForm, form_response};

/// Repository for form response operations.
#[derive(Clone)]
pub struct FormResponseRepository {
    db: Arc<DatabaseConnection>,
}

impl FormResponseRepository {
    /// Create a new form response repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check whether a submitter already answered a form.
    pub async fn exists(&self, form_id: &str, submitter_email: &str) -> AppResult<bool> {
        let count = FormResponse::find()
            .filter(form_response::Column::FormId.eq(form_id))
            .filter(form_response::Column::SubmitterEmail.eq(submitter_email))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Responses to a form, newest first.
    pub async fn find_by_form(
        &self,
        form_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<form_response::Model>> {
        FormResponse::find()
            .filter(form_response::Column::FormId.eq(form_id))
            .order_by(form_response::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count responses to a form.
    pub async fn count_by_form(&self, form_id: &str) -> AppResult<u64> {
        FormResponse::find()
            .filter(form_response::Column::FormId.eq(form_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a response and bump its form's counter in one transaction.
    ///
    /// Fails with [`AppError::NotAccepting`] when the form reached its ceiling,
    /// with [`AppError::FormNotFound`] when the form was deleted meanwhile and
    /// with [`AppError::DuplicateSubmission`] when the
    /// `(form_id, submitter_email)` unique index rejects the row. In every case
    /// nothing is written.
    pub async fn create_counted(
        &self,
        model: form_response::ActiveModel,
    ) -> AppResult<form_response::Model> {
        let form_id = model
            .form_id
            .clone()
            .take()
            .ok_or_else(|| AppError::Internal("Response has no form_id".to_string()))?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let counted = increment_if_below_ceiling(&txn, &form_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !counted {
            // Zero rows also means the form row is gone
            let form_exists = SocietyForm::find_by_id(form_id.clone())
                .one(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .is_some();
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(if form_exists {
                AppError::NotAccepting("submission limit reached".to_string())
            } else {
                AppError::FormNotFound(form_id)
            });
        }

        let inserted = match model.insert(&txn).await {
            Ok(inserted) => inserted,
            Err(err) => {
                txn.rollback()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                return Err(map_insert_error(&err));
            }
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted)
    }
}

fn map_insert_error(err: &DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(detail = %detail, "Concurrent duplicate submission rejected");
            AppError::DuplicateSubmission
        }
        _ => AppError::Database(err.to_string()),
    }
}
