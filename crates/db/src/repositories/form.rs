//! Society form repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use collexo_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    prelude::DateTimeWithTimeZone, sea_query::Expr,
};

use crate::entities::{SocietyForm, society_form};

/// Repository for society form operations.
#[derive(Clone)]
pub struct FormRepository {
    db: Arc<DatabaseConnection>,
}

impl FormRepository {
    /// Create a new form repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a form by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<society_form::Model>> {
        SocietyForm::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a form by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<society_form::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::FormNotFound(id.to_string()))
    }

    /// Find forms owned by a society, newest first.
    pub async fn find_by_society(
        &self,
        society_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<society_form::Model>> {
        SocietyForm::find()
            .filter(society_form::Column::SocietyId.eq(society_id))
            .order_by(society_form::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count forms owned by a society.
    pub async fn count_by_society(&self, society_id: &str) -> AppResult<u64> {
        SocietyForm::find()
            .filter(society_form::Column::SocietyId.eq(society_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new form.
    pub async fn create(&self, model: society_form::ActiveModel) -> AppResult<society_form::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set the activation flag of a form.
    pub async fn set_active(
        &self,
        form: society_form::Model,
        is_active: bool,
    ) -> AppResult<society_form::Model> {
        let mut active: society_form::ActiveModel = form.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a form. Its responses go with it through the cascading foreign key.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = SocietyForm::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Save edited form metadata.
    pub async fn update(
        &self,
        mut active: society_form::ActiveModel,
    ) -> AppResult<society_form::Model> {
        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Forms accepting submissions at `now`, newest first.
    pub async fn find_accepting(
        &self,
        now: DateTime<Utc>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<society_form::Model>> {
        SocietyForm::find()
            .filter(accepting_at(now))
            .order_by(society_form::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count forms accepting submissions at `now`.
    pub async fn count_accepting(&self, now: DateTime<Utc>) -> AppResult<u64> {
        SocietyForm::find()
            .filter(accepting_at(now))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

fn below_ceiling() -> Condition {
    Condition::any()
        .add(society_form::Column::MaxSubmissions.is_null())
        .add(
            Expr::col(society_form::Column::SubmissionsCount)
                .lt(Expr::col(society_form::Column::MaxSubmissions)),
        )
}

/// Same rules as the acceptance gate, evaluated by the database.
fn accepting_at(now: DateTime<Utc>) -> Condition {
    let now: DateTimeWithTimeZone = now.into();

    Condition::all()
        .add(society_form::Column::IsActive.eq(true))
        .add(
            Condition::any()
                .add(society_form::Column::StartDate.is_null())
                .add(society_form::Column::StartDate.lte(now)),
        )
        .add(
            Condition::any()
                .add(society_form::Column::EndDate.is_null())
                .add(society_form::Column::EndDate.gte(now)),
        )
        .add(below_ceiling())
}

/// Conditional `submissions_count + 1`, guarded by `max_submissions`.
pub(super) async fn increment_if_below_ceiling<C>(conn: &C, id: &str) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let result = SocietyForm::update_many()
        .col_expr(
            society_form::Column::SubmissionsCount,
            Expr::col(society_form::Column::SubmissionsCount).add(1),
        )
        .filter(society_form::Column::Id.eq(id))
        .filter(below_ceiling())
        .exec(conn)
        .await?;

    Ok(result.rows_affected == 1)
}
