//! Daily record entry.
//!
//! Records are append-only. Creation validates the form, refuses a record whose
//! route/operator pair has no registered route, and writes with an atomic
//! insert-if-absent so two concurrent entries for the same key cannot both land.

use super::{
    keys::{daily_record_key, route_key},
    route::{get_route_by_key, parse_date},
    session::Session,
    user::get_user,
};
use crate::{
    entities::{DailyRecord, Role, Shift, daily_record},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use tracing::{info, instrument, warn};

/// Largest accepted delivery or return count for one record.
pub const MAX_DAILY_COUNT: i64 = 100_000;

/// One day's counts for one route, as entered on the form.
#[derive(Debug, Clone)]
pub struct RecordEntry {
    /// `YYYY-MM-DD`
    pub date: String,
    /// Operator account id, any case
    pub operator_id: String,
    /// Route code, any case
    pub route: String,
    /// Day or night
    pub shift: Option<Shift>,
    /// Delivered units
    pub delivery_count: i64,
    /// Returned units
    pub return_count: i64,
}

/// Driver identity stamped onto a record.
#[derive(Debug, Clone)]
pub struct DriverRef {
    /// Driver uid
    pub uid: String,
    /// Driver email
    pub email: String,
    /// Driver display name
    pub name: String,
}

/// Records the session user's own counts (driver entry form).
pub async fn submit_own_record(
    db: &DatabaseConnection,
    session: &Session,
    entry: RecordEntry,
) -> Result<daily_record::Model> {
    session.require(Role::Driver, "submit a daily record")?;
    let driver = get_user(db, &session.uid)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            uid: session.uid.clone(),
        })?;
    create_daily_record(
        db,
        DriverRef {
            uid: driver.uid,
            email: driver.email,
            name: driver.name,
        },
        entry,
    )
    .await
}

/// Records counts on behalf of a driver (admin entry form).
pub async fn record_for_driver(
    db: &DatabaseConnection,
    session: &Session,
    driver_uid: &str,
    entry: RecordEntry,
) -> Result<daily_record::Model> {
    session.require(Role::Admin, "record on behalf of a driver")?;
    if driver_uid.trim().is_empty() {
        return Err(Error::validation("driver", "is required"));
    }
    let driver = get_user(db, driver_uid)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            uid: driver_uid.to_string(),
        })?;
    create_daily_record(
        db,
        DriverRef {
            uid: driver.uid,
            email: driver.email,
            name: driver.name,
        },
        entry,
    )
    .await
}

/// Validates and writes a daily record.
///
/// # Errors
/// * [`Error::Validation`] - a required field is missing or a count is negative
/// * [`Error::DuplicateRecord`] - a record already exists for the identity key
/// * [`Error::RouteNotRegistered`] - no route for the route/operator pair
#[instrument(skip(db, driver), fields(uid = %driver.uid))]
pub async fn create_daily_record(
    db: &DatabaseConnection,
    driver: DriverRef,
    entry: RecordEntry,
) -> Result<daily_record::Model> {
    let date = parse_date("date", &entry.date)?;
    let operator_id = entry.operator_id.trim().to_lowercase();
    let route = entry.route.trim().to_lowercase();
    if operator_id.is_empty() {
        return Err(Error::validation("operator_id", "is required"));
    }
    if route.is_empty() {
        return Err(Error::validation("route", "is required"));
    }
    let shift = entry
        .shift
        .ok_or_else(|| Error::validation("shift", "is required"))?;
    if entry.delivery_count < 0 {
        return Err(Error::validation("delivery_count", "must not be negative"));
    }
    if entry.return_count < 0 {
        return Err(Error::validation("return_count", "must not be negative"));
    }
    for (field, count) in [
        ("delivery_count", entry.delivery_count),
        ("return_count", entry.return_count),
    ] {
        if count > MAX_DAILY_COUNT {
            return Err(Error::validation(
                field,
                format!("must not exceed {MAX_DAILY_COUNT}"),
            ));
        }
    }

    let key = daily_record_key(&driver.uid, &date, &operator_id, &route);
    if DailyRecord::find_by_id(key.clone()).one(db).await?.is_some() {
        warn!("Daily record {key} already exists");
        return Err(Error::DuplicateRecord { key });
    }

    if get_route_by_key(db, &route_key(&route, &operator_id))
        .await?
        .is_none()
    {
        return Err(Error::RouteNotRegistered {
            route: entry.route.trim().to_string(),
            operator_id: entry.operator_id.trim().to_string(),
        });
    }

    let model = daily_record::ActiveModel {
        id: Set(key.clone()),
        uid: Set(driver.uid),
        email: Set(driver.email),
        name: Set(driver.name),
        delivery_date: Set(date),
        operator_id: Set(operator_id),
        route: Set(route),
        shift: Set(shift),
        delivery_count: Set(entry.delivery_count),
        return_count: Set(entry.return_count),
        total_count: Set(entry.delivery_count + entry.return_count),
        created_at: Set(chrono::Utc::now()),
    };

    // The existence check above only produces the friendly message; this
    // conditional insert is what enforces uniqueness.
    let inserted = DailyRecord::insert(model)
        .on_conflict(
            OnConflict::column(daily_record::Column::Id)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    if inserted == 0 {
        warn!("Daily record {key} was written concurrently");
        return Err(Error::DuplicateRecord { key });
    }

    info!("Daily record {key} saved");
    DailyRecord::find_by_id(key.clone())
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(key).into())
}

/// All records with `start <= delivery_date <= end`, compared as strings.
pub async fn records_in_range<C>(
    db: &C,
    start_date: &str,
    end_date: &str,
) -> Result<Vec<daily_record::Model>>
where
    C: ConnectionTrait,
{
    DailyRecord::find()
        .filter(daily_record::Column::DeliveryDate.gte(start_date))
        .filter(daily_record::Column::DeliveryDate.lte(end_date))
        .order_by_asc(daily_record::Column::DeliveryDate)
        .all(db)
        .await
        .map_err(Into::into)
}
