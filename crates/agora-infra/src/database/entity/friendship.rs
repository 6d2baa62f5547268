//! Friendship entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "friendships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub friend_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FriendId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Friend,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for agora_core::domain::Friendship {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            friend_id: model.friend_id,
            created_at: model.created_at.into(),
        }
    }
}

impl From<agora_core::domain::Friendship> for ActiveModel {
    fn from(friendship: agora_core::domain::Friendship) -> Self {
        Self {
            user_id: Set(friendship.user_id),
            friend_id: Set(friendship.friend_id),
            created_at: Set(friendship.created_at.into()),
        }
    }
}
