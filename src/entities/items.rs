use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub item_type: String, // "lost" or "found"
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub date: DateTimeUtc,
    pub image_url: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub status: String, // "active", "claimed", "expired" or "marketplace"
    pub user_id: String,
    pub expires_at: Option<DateTimeUtc>, // found items only: date + hold period
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::claims::Entity")]
    Claims,
    #[sea_orm(has_many = "super::marketplace_items::Entity")]
    MarketplaceItems,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::claims::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Claims.def()
    }
}

impl Related<super::marketplace_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MarketplaceItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
