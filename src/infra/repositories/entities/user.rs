//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{PendingToken, User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub phone_number: String,
    pub password_hash: String,
    pub role: String,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub verification_expires_at: Option<DateTimeUtc>,
    pub reset_token: Option<String>,
    pub reset_expires_at: Option<DateTimeUtc>,
    pub favorites: Vec<Uuid>,
    pub wishlist: Vec<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn pending(token: Option<String>, expires_at: Option<DateTimeUtc>) -> Option<PendingToken> {
    match (token, expires_at) {
        (Some(token), Some(expires_at)) => Some(PendingToken { token, expires_at }),
        _ => None,
    }
}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            name: model.name,
            email: model.email,
            phone_number: model.phone_number,
            password_hash: model.password_hash,
            role: UserRole::from(model.role.as_str()),
            is_verified: model.is_verified,
            verification: pending(model.verification_token, model.verification_expires_at),
            password_reset: pending(model.reset_token, model.reset_expires_at),
            favorites: model.favorites,
            wishlist: model.wishlist,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
