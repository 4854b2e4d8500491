//! Society form entity: a recruitment form and its acceptance state.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "society_form")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning society
    #[sea_orm(indexed)]
    pub society_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Field definitions (JSON array)
    #[sea_orm(column_type = "JsonBinary")]
    pub form_schema: JsonValue,

    pub is_active: bool,

    /// Submission ceiling (null for unlimited)
    #[sea_orm(nullable)]
    pub max_submissions: Option<i32>,

    /// Accepted submissions so far
    pub submissions_count: i32,

    /// Opening instant of the acceptance window
    #[sea_orm(nullable)]
    pub start_date: Option<DateTimeWithTimeZone>,

    /// Closing instant of the acceptance window
    #[sea_orm(nullable)]
    pub end_date: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::form_response::Entity")]
    FormResponse,
}

impl Related<super::form_response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FormResponse.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
