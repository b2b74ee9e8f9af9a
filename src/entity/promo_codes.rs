use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "promo_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    /// Owner of a private code; `None` for public codes.
    pub user_id: Option<Uuid>,
    pub discount_percent: i32,
    pub expiry_date: DateTimeWithTimeZone,
    pub is_public: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::promo_redemptions::Entity")]
    PromoRedemptions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::promo_redemptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromoRedemptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
