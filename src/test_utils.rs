//! Shared test utilities.
//!
//! Helpers for setting up an in-memory database and creating users, routes and
//! daily records with sensible defaults.

use crate::{
    core::{
        aggregation::DriverSummary,
        keys::{daily_record_key, route_key},
        record::{self, DriverRef, RecordEntry},
        route::{self as core_route, RouteInput},
        user::{NewUser, register_user},
    },
    entities::{Role, RouteType, Shift, daily_record, route, user},
    errors::Result,
};
use chrono::{TimeZone, Utc};
use sea_orm::DatabaseConnection;
use std::collections::BTreeSet;
use tracing_subscriber::EnvFilter;

/// Routes test logs through the test writer. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers a driver with email `{uid}@example.com`.
pub async fn create_test_driver(
    db: &DatabaseConnection,
    uid: &str,
    name: &str,
) -> Result<user::Model> {
    register_user(
        db,
        NewUser {
            uid: uid.to_string(),
            email: format!("{uid}@example.com"),
            name: name.to_string(),
            itkoo_id: format!("IT-{uid}"),
            role: Role::Driver,
        },
    )
    .await
}

/// Registers an admin.
pub async fn create_test_admin(db: &DatabaseConnection, uid: &str) -> Result<user::Model> {
    register_user(
        db,
        NewUser {
            uid: uid.to_string(),
            email: format!("{uid}@example.com"),
            name: "Admin".to_string(),
            itkoo_id: format!("IT-{uid}"),
            role: Role::Admin,
        },
    )
    .await
}

/// Route input with defaults: fixed, day shift, starting 2024-01-01.
#[must_use]
pub fn test_route_input(
    route: &str,
    operator_id: &str,
    driver_unit_price: i64,
    operator_unit_price: Option<i64>,
) -> RouteInput {
    RouteInput {
        route: route.to_string(),
        operator_id: operator_id.to_string(),
        route_type: RouteType::Fixed,
        shift: Shift::Day,
        driver_unit_price,
        operator_unit_price,
        start_date: "2024-01-01".to_string(),
    }
}

/// Registers a route with [`test_route_input`] defaults.
pub async fn create_test_route(
    db: &DatabaseConnection,
    route: &str,
    operator_id: &str,
    driver_unit_price: i64,
    operator_unit_price: Option<i64>,
) -> Result<route::Model> {
    core_route::upsert_route(
        db,
        test_route_input(route, operator_id, driver_unit_price, operator_unit_price),
    )
    .await
}

/// Driver identity with email `{uid}@example.com` and name `Driver {uid}`.
#[must_use]
pub fn test_driver_ref(uid: &str) -> DriverRef {
    DriverRef {
        uid: uid.to_string(),
        email: format!("{uid}@example.com"),
        name: format!("Driver {uid}"),
    }
}

/// Day-shift form entry.
#[must_use]
pub fn test_entry(
    date: &str,
    operator_id: &str,
    route: &str,
    delivery_count: i64,
    return_count: i64,
) -> RecordEntry {
    RecordEntry {
        date: date.to_string(),
        operator_id: operator_id.to_string(),
        route: route.to_string(),
        shift: Some(Shift::Day),
        delivery_count,
        return_count,
    }
}

/// Writes a daily record through the normal entry path (route must exist).
pub async fn create_test_record(
    db: &DatabaseConnection,
    uid: &str,
    date: &str,
    operator_id: &str,
    route: &str,
    delivery_count: i64,
    return_count: i64,
) -> Result<daily_record::Model> {
    record::create_daily_record(
        db,
        test_driver_ref(uid),
        test_entry(date, operator_id, route, delivery_count, return_count),
    )
    .await
}

/// In-memory daily record, for tests that fold without a database.
#[must_use]
pub fn test_record_model(
    uid: &str,
    date: &str,
    operator_id: &str,
    route: &str,
    delivery_count: i64,
    return_count: i64,
) -> daily_record::Model {
    let driver = test_driver_ref(uid);
    daily_record::Model {
        id: daily_record_key(uid, date, operator_id, route),
        uid: driver.uid,
        email: driver.email,
        name: driver.name,
        delivery_date: date.to_string(),
        operator_id: operator_id.to_lowercase(),
        route: route.to_lowercase(),
        shift: Shift::Day,
        delivery_count,
        return_count,
        total_count: delivery_count.wrapping_add(return_count),
        created_at: fixed_timestamp(),
    }
}

/// In-memory route, for tests that build a resolver without a database.
#[must_use]
pub fn test_route_model(
    route: &str,
    operator_id: &str,
    driver_unit_price: i64,
    operator_unit_price: i64,
) -> route::Model {
    route::Model {
        id: route_key(route, operator_id),
        route: route.to_string(),
        operator_id: operator_id.to_string(),
        route_type: RouteType::Fixed,
        shift: Shift::Day,
        driver_unit_price,
        operator_unit_price,
        start_date: "2024-01-01".to_string(),
        created_at: fixed_timestamp(),
    }
}

/// A summary carrying only a driver income, for payout tests.
#[must_use]
pub fn test_summary(uid: &str, driver_income: i64) -> DriverSummary {
    let driver = test_driver_ref(uid);
    DriverSummary {
        uid: driver.uid,
        email: driver.email,
        name: driver.name,
        routes: BTreeSet::from(["b101".to_string()]),
        operator_ids: BTreeSet::from(["cp1".to_string()]),
        total_delivery: 0,
        total_return: 0,
        total_count: 0,
        operator_income: 0,
        driver_income,
        company_fee: -driver_income,
        route_details: Vec::new(),
        unpriced_routes: BTreeSet::new(),
    }
}

fn fixed_timestamp() -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_714_521_600, 0).single().unwrap_or_default()
}
