//! Route registration - the unit-price table every aggregation joins against.
//!
//! Routes are upserted by key, so re-registering a route/operator pair replaces
//! its prices. Deleting a route leaves its daily records in place; they price at
//! zero on the next aggregation.

use super::keys::route_key;
use crate::{
    entities::{Route, RouteType, Shift, route},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use tracing::{info, instrument, warn};

/// Largest accepted unit price, in won.
pub const MAX_UNIT_PRICE: i64 = 1_000_000;

/// Input for [`upsert_route`].
#[derive(Debug, Clone)]
pub struct RouteInput {
    /// Route code, e.g. `B101`
    pub route: String,
    /// Operator account id
    pub operator_id: String,
    /// Fixed or backup
    pub route_type: RouteType,
    /// Day or night
    pub shift: Shift,
    /// Won paid to the driver per unit
    pub driver_unit_price: i64,
    /// Won received from the operator per unit; 0 when not given
    pub operator_unit_price: Option<i64>,
    /// `YYYY-MM-DD` date the prices take effect
    pub start_date: String,
}

/// Creates or replaces the route for `input.route`/`input.operator_id`.
///
/// Route code, operator id and start date are required and prices must be
/// non-negative.
#[instrument(skip(db))]
pub async fn upsert_route(db: &DatabaseConnection, input: RouteInput) -> Result<route::Model> {
    let route_code = input.route.trim();
    let operator_id = input.operator_id.trim();
    if route_code.is_empty() {
        return Err(Error::validation("route", "is required"));
    }
    if operator_id.is_empty() {
        return Err(Error::validation("operator_id", "is required"));
    }
    let start_date = parse_date("start_date", &input.start_date)?;
    let operator_unit_price = input.operator_unit_price.unwrap_or(0);
    if input.driver_unit_price < 0 {
        return Err(Error::validation("driver_unit_price", "must not be negative"));
    }
    if operator_unit_price < 0 {
        return Err(Error::validation("operator_unit_price", "must not be negative"));
    }
    for (field, price) in [
        ("driver_unit_price", input.driver_unit_price),
        ("operator_unit_price", operator_unit_price),
    ] {
        if price > MAX_UNIT_PRICE {
            return Err(Error::validation(
                field,
                format!("must not exceed {MAX_UNIT_PRICE}"),
            ));
        }
    }
    if operator_unit_price > 0 && operator_unit_price < input.driver_unit_price {
        warn!(
            route = route_code,
            operator_id, "Operator price is below driver price; company fee will be negative"
        );
    }

    let id = route_key(route_code, operator_id);
    let model = route::ActiveModel {
        id: Set(id.clone()),
        route: Set(route_code.to_string()),
        operator_id: Set(operator_id.to_string()),
        route_type: Set(input.route_type),
        shift: Set(input.shift),
        driver_unit_price: Set(input.driver_unit_price),
        operator_unit_price: Set(operator_unit_price),
        start_date: Set(start_date),
        created_at: Set(chrono::Utc::now()),
    };

    Route::insert(model)
        .on_conflict(
            OnConflict::column(route::Column::Id)
                .update_columns([
                    route::Column::Route,
                    route::Column::OperatorId,
                    route::Column::RouteType,
                    route::Column::Shift,
                    route::Column::DriverUnitPrice,
                    route::Column::OperatorUnitPrice,
                    route::Column::StartDate,
                    route::Column::CreatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    info!("Route {id} saved");
    get_route(db, route_code, operator_id)
        .await?
        .ok_or_else(|| Error::RouteNotRegistered {
            route: route_code.to_string(),
            operator_id: operator_id.to_string(),
        })
}

/// Looks up the route for a route/operator pair in any letter case.
pub async fn get_route(
    db: &DatabaseConnection,
    route: &str,
    operator_id: &str,
) -> Result<Option<route::Model>> {
    get_route_by_key(db, &route_key(route, operator_id)).await
}

/// Looks up a route by its stored key.
pub async fn get_route_by_key<C>(db: &C, key: &str) -> Result<Option<route::Model>>
where
    C: ConnectionTrait,
{
    Route::find_by_id(key.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every registered route ordered by key.
pub async fn list_routes<C>(db: &C) -> Result<Vec<route::Model>>
where
    C: ConnectionTrait,
{
    Route::find()
        .order_by_asc(route::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a route. Returns `false` if nothing was registered under the key.
#[instrument(skip(db))]
pub async fn delete_route(db: &DatabaseConnection, route: &str, operator_id: &str) -> Result<bool> {
    let key = route_key(route, operator_id);
    let result = Route::delete_by_id(key.clone()).exec(db).await?;
    if result.rows_affected > 0 {
        info!("Route {key} deleted");
    }
    Ok(result.rows_affected > 0)
}

/// Parses a `YYYY-MM-DD` date and returns it in canonical form.
pub(crate) fn parse_date(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(field, "is required"));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|e| Error::validation(field, format!("expected YYYY-MM-DD: {e}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_upsert_route_stores_normalised_key() -> Result<()> {
        let db = setup_test_db().await?;
        let saved = create_test_route(&db, "b101", "cp1", 500, Some(700)).await?;

        assert_eq!(saved.id, "B101_CP1");
        assert_eq!(saved.route, "b101");
        assert_eq!(saved.driver_unit_price, 500);
        assert_eq!(saved.operator_unit_price, 700);

        let found = get_route(&db, "B101", "CP1").await?.unwrap();
        assert_eq!(found, saved);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_route_replaces_prices() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_route(&db, "B101", "cp1", 500, Some(700)).await?;
        let updated = create_test_route(&db, "b101", "CP1", 550, None).await?;

        assert_eq!(updated.driver_unit_price, 550);
        assert_eq!(updated.operator_unit_price, 0);
        assert_eq!(list_routes(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_route_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let mut input = test_route_input("B101", "cp1", 500, None);
        input.route = "  ".to_string();
        assert!(matches!(
            upsert_route(&db, input).await,
            Err(Error::Validation { ref field, .. }) if field == "route"
        ));

        let input = test_route_input("B101", "cp1", -1, None);
        assert!(matches!(
            upsert_route(&db, input).await,
            Err(Error::Validation { ref field, .. }) if field == "driver_unit_price"
        ));

        let input = test_route_input("B101", "cp1", 500, Some(1_000_000_000_000));
        assert!(matches!(
            upsert_route(&db, input).await,
            Err(Error::Validation { ref field, .. }) if field == "operator_unit_price"
        ));

        let input = test_route_input("B101", "cp1", MAX_UNIT_PRICE + 1, None);
        assert!(matches!(
            upsert_route(&db, input).await,
            Err(Error::Validation { ref field, .. }) if field == "driver_unit_price"
        ));

        let mut input = test_route_input("B101", "cp1", 500, None);
        input.start_date = "05/01/2024".to_string();
        assert!(matches!(
            upsert_route(&db, input).await,
            Err(Error::Validation { ref field, .. }) if field == "start_date"
        ));

        assert!(list_routes(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_route() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_route(&db, "B101", "cp1", 500, Some(700)).await?;

        assert!(delete_route(&db, "b101", "CP1").await?);
        assert!(get_route(&db, "B101", "cp1").await?.is_none());
        assert!(!delete_route(&db, "b101", "CP1").await?);
        Ok(())
    }

    #[test]
    fn test_parse_date_canonicalises() {
        assert_eq!(parse_date("date", " 2024-05-01 ").unwrap(), "2024-05-01");
        assert!(parse_date("date", "2024-5-1").is_ok());
        assert!(parse_date("date", "").is_err());
        assert!(parse_date("date", "2024-13-01").is_err());
    }
}
