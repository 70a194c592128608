use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pastes")]
pub struct Model {
    /// Short random hex token, also used in URLs
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub language: Option<String>,

    pub is_public: bool,

    pub views: i64,

    pub expires_at: Option<DateTimeUtc>,

    pub burn_after_read: bool,

    /// NULL for anonymous pastes
    #[sea_orm(indexed)]
    pub user_id: Option<i32>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
