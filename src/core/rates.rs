//! Rate resolution - joins a route/operator pair to its unit prices.
//!
//! Lookups fail soft: a pair with no registered route prices at zero instead of
//! raising an error. Callers that need to tell "unregistered" apart from
//! "registered at zero" use [`RateResolver::lookup`].

use super::keys::route_key;
use crate::{
    entities::{Route, route},
    errors::Result,
};
use sea_orm::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// SQLite caps bound parameters per statement; route keys are fetched in chunks.
const KEY_CHUNK: usize = 500;

/// Unit prices effective for one route/operator pair, in won per unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnitPrices {
    /// Paid to the driver
    pub driver_unit_price: i64,
    /// Received from the operator
    pub operator_unit_price: i64,
}

impl From<&route::Model> for UnitPrices {
    fn from(route: &route::Model) -> Self {
        Self {
            driver_unit_price: route.driver_unit_price,
            operator_unit_price: route.operator_unit_price,
        }
    }
}

/// In-memory price table for one aggregation run.
///
/// Built once from the store, then every record is joined against it without
/// further round trips. Nothing mutates the table after construction, so
/// repeated lookups of the same pair always agree.
#[derive(Debug, Clone, Default)]
pub struct RateResolver {
    rates: HashMap<String, UnitPrices>,
}

impl RateResolver {
    /// Builds a resolver from already-loaded routes.
    pub fn from_routes<'a, I>(routes: I) -> Self
    where
        I: IntoIterator<Item = &'a route::Model>,
    {
        let rates = routes
            .into_iter()
            .map(|r| (r.id.clone(), UnitPrices::from(r)))
            .collect();
        Self { rates }
    }

    /// Loads only the routes named by `keys` (route keys as built by
    /// [`route_key`]).
    pub async fn preload<C>(db: &C, keys: &[String]) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        let mut routes = Vec::with_capacity(keys.len());
        for chunk in keys.chunks(KEY_CHUNK) {
            let found = Route::find()
                .filter(route::Column::Id.is_in(chunk.iter().cloned()))
                .all(db)
                .await?;
            routes.extend(found);
        }
        debug!(
            "Preloaded {} of {} referenced routes",
            routes.len(),
            keys.len()
        );
        Ok(Self::from_routes(&routes))
    }

    /// Prices for the pair, or `None` if no route is registered for it.
    #[must_use]
    pub fn lookup(&self, route: &str, operator_id: &str) -> Option<UnitPrices> {
        self.lookup_key(&route_key(route, operator_id))
    }

    /// Prices under an already-built route key.
    #[must_use]
    pub fn lookup_key(&self, key: &str) -> Option<UnitPrices> {
        self.rates.get(key).copied()
    }

    /// Prices for the pair, falling back to zero for unregistered routes.
    #[must_use]
    pub fn resolve(&self, route: &str, operator_id: &str) -> UnitPrices {
        self.lookup(route, operator_id)
            .unwrap_or_else(|| missing_price(&route_key(route, operator_id)))
    }

    /// Number of registered pairs held.
    pub(crate) fn len(&self) -> usize {
        self.rates.len()
    }
}

/// Zero prices for a route key with no registered route. Logged so a missing
/// route is distinguishable from one registered at zero.
pub(crate) fn missing_price(key: &str) -> UnitPrices {
    warn!(route_key = key, "No route registered; pricing at zero");
    UnitPrices::default()
}

/// Single-shot lookup straight from the store, with the same zero fallback as
/// [`RateResolver::resolve`].
pub async fn resolve_rate<C>(db: &C, route: &str, operator_id: &str) -> Result<UnitPrices>
where
    C: ConnectionTrait,
{
    let resolver = RateResolver::preload(db, &[route_key(route, operator_id)]).await?;
    Ok(resolver.resolve(route, operator_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_resolve_rate_registered_route() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_route(&db, "B101", "CP1", 500, Some(700)).await?;

        let prices = resolve_rate(&db, "b101", "cp1").await?;
        assert_eq!(
            prices,
            UnitPrices {
                driver_unit_price: 500,
                operator_unit_price: 700
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_rate_unregistered_route_is_zero_not_error() -> Result<()> {
        let db = setup_test_db().await?;
        let prices = resolve_rate(&db, "Z999", "nobody").await?;
        assert_eq!(prices, UnitPrices::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_preload_only_keeps_requested_keys() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_route(&db, "B101", "cp1", 500, Some(700)).await?;
        create_test_route(&db, "C202", "cp2", 300, Some(450)).await?;

        let resolver =
            RateResolver::preload(&db, &["B101_CP1".to_string(), "X_Y".to_string()]).await?;

        assert_eq!(resolver.len(), 1);
        assert!(resolver.lookup("b101", "CP1").is_some());
        assert!(resolver.lookup_key("B101_CP1").is_some());
        assert!(resolver.lookup("c202", "cp2").is_none());
        assert!(resolver.lookup("x", "y").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_lookup_distinguishes_zero_priced_from_missing() -> Result<()> {
        let db = setup_test_db().await?;
        let free = create_test_route(&db, "FREE", "cp1", 0, None).await?;
        let resolver = RateResolver::from_routes([&free]);

        assert_eq!(resolver.lookup("free", "cp1"), Some(UnitPrices::default()));
        assert_eq!(resolver.lookup("gone", "cp1"), None);
        assert_eq!(resolver.resolve("gone", "cp1"), UnitPrices::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_resolution_is_stable() -> Result<()> {
        let db = setup_test_db().await?;
        let route = create_test_route(&db, "B101", "cp1", 500, Some(700)).await?;
        let resolver = RateResolver::from_routes([&route]);

        let first = resolver.resolve("B101", "cp1");
        let second = resolver.resolve("b101", "CP1");
        assert_eq!(first, second);
        assert_eq!(first.driver_unit_price, 500);
        Ok(())
    }
}
