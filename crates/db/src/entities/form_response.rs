//! Form response entity: one student's submission to a society form.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "form_response")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub form_id: String,

    /// Field name to submitted value (string or string array)
    #[sea_orm(column_type = "JsonBinary")]
    pub submission_data: JsonValue,

    /// Lower-cased; unique together with `form_id`
    #[sea_orm(indexed)]
    pub submitter_email: String,

    pub submitter_name: String,

    #[sea_orm(nullable)]
    pub submitter_phone: Option<String>,

    /// Uploaded file metadata (JSON array)
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub files_json: Option<JsonValue>,

    #[sea_orm(nullable)]
    pub ip_address: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub user_agent: Option<String>,

    #[sea_orm(nullable)]
    pub honeypot_value: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::society_form::Entity",
        from = "Column::FormId",
        to = "super::society_form::Column::Id",
        on_delete = "Cascade"
    )]
    SocietyForm,
}

impl Related<super::society_form::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SocietyForm.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
