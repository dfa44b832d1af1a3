//! Database configuration for the settlement desk.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables are
//! generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust models. Creation is idempotent so the
//! CLI can run it on every start.

use crate::entities::{DailyRecord, FinalPayout, Route, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/itkoo.sqlite?mode=rwc";

/// Gets the database URL from `DATABASE_URL` or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    ensure_sqlite_dir(&database_url)?;
    debug!("Connecting to {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the parent directory of a file-backed `SQLite` URL.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    match std::path::Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)?,
        _ => {}
    }
    Ok(())
}

/// Creates the users, routes, daily records and final payouts tables plus their
/// indexes, skipping any that already exist.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table_for(db, User).await?;
    create_table_for(db, Route).await?;
    create_table_for(db, DailyRecord).await?;
    create_table_for(db, FinalPayout).await?;
    info!("Settlement tables ensured");
    Ok(())
}

async fn create_table_for<E>(db: &DatabaseConnection, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(builder.build(&index)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DailyRecordModel, FinalPayoutModel, RouteModel, UserModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<RouteModel> = Route::find().limit(1).all(&db).await?;
        let _: Vec<DailyRecordModel> = DailyRecord::find().limit(1).all(&db).await?;
        let _: Vec<FinalPayoutModel> = FinalPayout::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[test]
    fn test_ensure_sqlite_dir() -> Result<()> {
        let dir = std::env::temp_dir().join("itkoo_db_dir_test");
        let _ = std::fs::remove_dir_all(&dir);
        let url = format!("sqlite://{}/nested/db.sqlite?mode=rwc", dir.display());

        ensure_sqlite_dir(&url)?;
        assert!(dir.join("nested").is_dir());

        // Memory URLs are left alone
        ensure_sqlite_dir("sqlite::memory:")?;
        let _ = std::fs::remove_dir_all(&dir);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
