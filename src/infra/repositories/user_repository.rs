//! User repository: accounts, verification state and saved lists.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter, Set,
    Statement,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, PendingToken, SavedList, User};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_phone(&self, phone_number: &str) -> AppResult<Option<User>>;

    async fn find_by_verification_token(&self, token: &str) -> AppResult<Option<User>>;

    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>>;

    /// Users with the given ids, in no particular order
    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<User>>;

    /// Insert a new unverified user. Duplicate email or phone is a `Conflict`.
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Mark verified and clear the verification token.
    async fn mark_verified(&self, id: Uuid) -> AppResult<()>;

    async fn set_reset_token(&self, id: Uuid, token: PendingToken) -> AppResult<()>;

    /// Store a new password hash and clear the reset token.
    async fn reset_password(&self, id: Uuid, password_hash: String) -> AppResult<()>;

    /// Add the property to one saved list when absent, remove it when present.
    /// Returns the stored list, or `None` for an unknown user.
    async fn toggle_saved(
        &self,
        id: Uuid,
        list: SavedList,
        property_id: Uuid,
    ) -> AppResult<Option<Vec<Uuid>>>;

    /// Append the ids missing from each stored list, in the given order.
    async fn append_saved(
        &self,
        id: Uuid,
        favorites: Vec<Uuid>,
        wishlist: Vec<Uuid>,
    ) -> AppResult<Option<User>>;
}

fn saved_column(list: SavedList) -> &'static str {
    match list {
        SavedList::Favorites => "favorites",
        SavedList::Wishlist => "wishlist",
    }
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: Uuid) -> AppResult<user::Model> {
        UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("User")
    }

    async fn find_one_by(&self, filter: sea_orm::sea_query::SimpleExpr) -> AppResult<Option<User>> {
        let result = UserEntity::find().filter(filter).one(&self.db).await?;
        Ok(result.map(User::from))
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one_by(user::Column::Email.eq(email.to_lowercase()))
            .await
    }

    async fn find_by_phone(&self, phone_number: &str) -> AppResult<Option<User>> {
        self.find_one_by(user::Column::PhoneNumber.eq(phone_number))
            .await
    }

    async fn find_by_verification_token(&self, token: &str) -> AppResult<Option<User>> {
        self.find_one_by(user::Column::VerificationToken.eq(token))
            .await
    }

    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>> {
        self.find_one_by(user::Column::ResetToken.eq(token)).await
    }

    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = UserEntity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_user.name),
            email: Set(new_user.email.to_lowercase()),
            phone_number: Set(new_user.phone_number),
            password_hash: Set(new_user.password_hash),
            role: Set(new_user.role.to_string()),
            is_verified: Set(false),
            verification_token: Set(Some(new_user.verification.token)),
            verification_expires_at: Set(Some(new_user.verification.expires_at)),
            reset_token: Set(None),
            reset_expires_at: Set(None),
            favorites: Set(Vec::new()),
            wishlist: Set(Vec::new()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| AppError::from_db_unique(e, "Email or phone number already registered"))?;
        Ok(User::from(model))
    }

    async fn mark_verified(&self, id: Uuid) -> AppResult<()> {
        let mut active: ActiveModel = self.find_model(id).await?.into();
        active.is_verified = Set(true);
        active.verification_token = Set(None);
        active.verification_expires_at = Set(None);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }

    async fn set_reset_token(&self, id: Uuid, token: PendingToken) -> AppResult<()> {
        let mut active: ActiveModel = self.find_model(id).await?.into();
        active.reset_token = Set(Some(token.token));
        active.reset_expires_at = Set(Some(token.expires_at));
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }

    async fn reset_password(&self, id: Uuid, password_hash: String) -> AppResult<()> {
        let mut active: ActiveModel = self.find_model(id).await?.into();
        active.password_hash = Set(password_hash);
        active.reset_token = Set(None);
        active.reset_expires_at = Set(None);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }

    async fn toggle_saved(
        &self,
        id: Uuid,
        list: SavedList,
        property_id: Uuid,
    ) -> AppResult<Option<Vec<Uuid>>> {
        let column = saved_column(list);
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            format!(
                r#"UPDATE users
                   SET {column} = CASE WHEN $1 = ANY({column})
                                       THEN array_remove({column}, $1)
                                       ELSE array_append({column}, $1) END,
                       updated_at = NOW()
                   WHERE id = $2
                   RETURNING *"#
            ),
            [property_id.into(), id.into()],
        );

        let result = UserEntity::find()
            .from_raw_sql(statement)
            .one(&self.db)
            .await?;
        Ok(result.map(|model| match list {
            SavedList::Favorites => model.favorites,
            SavedList::Wishlist => model.wishlist,
        }))
    }

    async fn append_saved(
        &self,
        id: Uuid,
        favorites: Vec<Uuid>,
        wishlist: Vec<Uuid>,
    ) -> AppResult<Option<User>> {
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"UPDATE users
               SET favorites = favorites || ARRAY(
                       SELECT f FROM unnest($2::uuid[]) WITH ORDINALITY AS t(f, n)
                       WHERE NOT f = ANY(users.favorites) ORDER BY n),
                   wishlist = wishlist || ARRAY(
                       SELECT w FROM unnest($3::uuid[]) WITH ORDINALITY AS t(w, n)
                       WHERE NOT w = ANY(users.wishlist) ORDER BY n),
                   updated_at = NOW()
               WHERE id = $1
               RETURNING *"#,
            [id.into(), favorites.into(), wishlist.into()],
        );

        let result = UserEntity::find()
            .from_raw_sql(statement)
            .one(&self.db)
            .await?;
        Ok(result.map(User::from))
    }
}
