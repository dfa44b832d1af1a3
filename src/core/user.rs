//! User registration and lookup.

use crate::{
    entities::{Role, User, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use tracing::{info, instrument};

/// Input for [`register_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Externally issued user id
    pub uid: String,
    /// Login email
    pub email: String,
    /// Display name
    pub name: String,
    /// Internal staff number
    pub itkoo_id: String,
    /// Admin or driver
    pub role: Role,
}

/// Creates or overwrites a user. Every field is required.
#[instrument(skip(db))]
pub async fn register_user(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model> {
    for (field, value) in [
        ("uid", &new_user.uid),
        ("email", &new_user.email),
        ("name", &new_user.name),
        ("itkoo_id", &new_user.itkoo_id),
    ] {
        if value.trim().is_empty() {
            return Err(Error::validation(field, "is required"));
        }
    }

    let model = user::ActiveModel {
        uid: Set(new_user.uid.trim().to_string()),
        email: Set(new_user.email.trim().to_string()),
        name: Set(new_user.name.trim().to_string()),
        itkoo_id: Set(new_user.itkoo_id.trim().to_string()),
        role: Set(new_user.role),
        created_at: Set(chrono::Utc::now()),
    };

    User::insert(model)
        .on_conflict(
            OnConflict::column(user::Column::Uid)
                .update_columns([
                    user::Column::Email,
                    user::Column::Name,
                    user::Column::ItkooId,
                    user::Column::Role,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let uid = new_user.uid.trim();
    info!("Registered {} {uid}", new_user.role.as_str());
    get_user(db, uid).await?.ok_or_else(|| Error::UserNotFound {
        uid: uid.to_string(),
    })
}

/// Looks up a user by uid.
pub async fn get_user(db: &DatabaseConnection, uid: &str) -> Result<Option<user::Model>> {
    User::find_by_id(uid.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all users ordered by name.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists drivers only, ordered by name.
pub async fn list_drivers(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .filter(user::Column::Role.eq(Role::Driver))
        .order_by_asc(user::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of registered users, used to allow bootstrapping the first admin.
pub async fn count_users(db: &DatabaseConnection) -> Result<u64> {
    User::find().count(db).await.map_err(Into::into)
}
