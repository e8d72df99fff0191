use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "marketplace_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    // Unique: at most one listing per source item. No FK constraint, listings
    // keep an orphan reference if the item is ever deleted.
    #[sea_orm(unique)]
    pub item_id: String,
    pub pickup_location: Option<String>,
    pub price: Option<f64>,
    pub status: String, // "available" or "claimed"
    pub listed_at: DateTimeUtc,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTimeUtc>,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Entity::belongs_to(super::items::Entity)
            .from(Column::ItemId)
            .to(super::items::Column::Id)
            .into()
    }
}

impl ActiveModelBehavior for ActiveModel {}
