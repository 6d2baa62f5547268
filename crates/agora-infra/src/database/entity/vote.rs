//! Vote entity for SeaORM. One row per (user, post); `value` is +1 or -1.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use agora_core::domain::{Vote, VoteDirection};
use agora_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub post_id: Uuid,
    pub value: i16,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn direction(&self) -> Result<VoteDirection, RepoError> {
        VoteDirection::try_from(self.value).map_err(|_| {
            RepoError::Query(format!(
                "vote ({}, {}) holds invalid value {}",
                self.user_id, self.post_id, self.value
            ))
        })
    }
}

impl TryFrom<Model> for Vote {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            direction: model.direction()?,
            user_id: model.user_id,
            post_id: model.post_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<Vote> for ActiveModel {
    fn from(vote: Vote) -> Self {
        Self {
            user_id: Set(vote.user_id),
            post_id: Set(vote.post_id),
            value: Set(i8::from(vote.direction).into()),
            created_at: Set(vote.created_at.into()),
            updated_at: Set(vote.updated_at.into()),
        }
    }
}
