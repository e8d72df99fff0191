use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "claims")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    // No FK constraint: claims outlive deleted items as orphan references.
    pub item_id: String,
    pub claimant_id: String,
    pub description: String,
    pub verification_details: String,
    pub status: String, // "pending", "approved" or "rejected"
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
    pub reviewed_at: Option<DateTimeUtc>,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ClaimantId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Claimant,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Claimant.def()
    }
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Entity::belongs_to(super::items::Entity)
            .from(Column::ItemId)
            .to(super::items::Column::Id)
            .into()
    }
}

impl ActiveModelBehavior for ActiveModel {}
