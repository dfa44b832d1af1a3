//! Aggregation engine - folds a date range of daily records into one summary
//! per driver.
//!
//! Every quantity in a summary is a sum, so totals do not depend on the order
//! records come back from the store. Route details are sorted once folding is
//! done, which makes the whole summary deterministic for a given snapshot.

use super::{
    keys::route_key,
    rates::{RateResolver, UnitPrices, missing_price},
    record::records_in_range,
    route::parse_date,
};
use crate::{
    config::SettlementPolicy,
    entities::daily_record,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, instrument};

/// Inclusive settlement period, both ends as canonical `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    /// First day included
    pub start_date: String,
    /// Last day included
    pub end_date: String,
}

impl Period {
    /// Validates both dates and their order.
    pub fn new(start_date: &str, end_date: &str) -> Result<Self> {
        let start_date = parse_date("start_date", start_date)?;
        let end_date = parse_date("end_date", end_date)?;
        if start_date > end_date {
            return Err(Error::validation(
                "end_date",
                format!("{end_date} is before {start_date}"),
            ));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ~ {}", self.start_date, self.end_date)
    }
}

/// Breakdown of a single daily record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDetail {
    pub delivery_date: String,
    pub route: String,
    pub operator_id: String,
    pub delivery_count: i64,
    pub return_count: i64,
    pub total_count: i64,
    /// Prices applied to this line
    pub prices: UnitPrices,
    /// `total_count * operator_unit_price`
    pub operator_income: i64,
    /// `total_count * driver_unit_price`
    pub driver_income: i64,
    /// `operator_income - driver_income`
    pub company_fee: i64,
}

/// Everything one driver did in a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverSummary {
    pub uid: String,
    pub email: String,
    pub name: String,
    /// Distinct routes driven
    pub routes: BTreeSet<String>,
    /// Distinct operator ids used
    pub operator_ids: BTreeSet<String>,
    pub total_delivery: i64,
    pub total_return: i64,
    pub total_count: i64,
    pub operator_income: i64,
    pub driver_income: i64,
    /// Margin kept by the company; negative when routes are mispriced
    pub company_fee: i64,
    pub route_details: Vec<RouteDetail>,
    /// Route keys that had no registered route and were priced at zero
    pub unpriced_routes: BTreeSet<String>,
}

impl DriverSummary {
    fn empty(record: &daily_record::Model) -> Self {
        Self {
            uid: record.uid.clone(),
            email: record.email.clone(),
            name: record.name.clone(),
            routes: BTreeSet::new(),
            operator_ids: BTreeSet::new(),
            total_delivery: 0,
            total_return: 0,
            total_count: 0,
            operator_income: 0,
            driver_income: 0,
            company_fee: 0,
            route_details: Vec::new(),
            unpriced_routes: BTreeSet::new(),
        }
    }

    fn accumulate(&mut self, detail: RouteDetail) -> Result<()> {
        let add = |total: i64, value: i64, what: &str| {
            total
                .checked_add(value)
                .ok_or_else(|| Error::overflow(&format!("{what} of driver {}", self.uid)))
        };
        let total_delivery = add(self.total_delivery, detail.delivery_count, "total delivery")?;
        let total_return = add(self.total_return, detail.return_count, "total return")?;
        let total_count = add(self.total_count, detail.total_count, "total count")?;
        let operator_income = add(self.operator_income, detail.operator_income, "operator income")?;
        let driver_income = add(self.driver_income, detail.driver_income, "driver income")?;
        let company_fee = add(self.company_fee, detail.company_fee, "company fee")?;

        self.total_delivery = total_delivery;
        self.total_return = total_return;
        self.total_count = total_count;
        self.operator_income = operator_income;
        self.driver_income = driver_income;
        self.company_fee = company_fee;
        self.routes.insert(detail.route.clone());
        self.operator_ids.insert(detail.operator_id.clone());
        self.route_details.push(detail);
        Ok(())
    }
}

/// Per-driver summaries keyed by uid.
pub type Summaries = BTreeMap<String, DriverSummary>;

/// Prices one record.
///
/// # Errors
/// [`Error::Overflow`] if a count or income leaves the `i64` range.
pub fn price_record(record: &daily_record::Model, prices: UnitPrices) -> Result<RouteDetail> {
    let overflow = |what: &str| Error::overflow(&format!("{what} of record {}", record.id));
    let total_count = record
        .delivery_count
        .checked_add(record.return_count)
        .ok_or_else(|| overflow("total count"))?;
    let operator_income = total_count
        .checked_mul(prices.operator_unit_price)
        .ok_or_else(|| overflow("operator income"))?;
    let driver_income = total_count
        .checked_mul(prices.driver_unit_price)
        .ok_or_else(|| overflow("driver income"))?;
    let company_fee = operator_income
        .checked_sub(driver_income)
        .ok_or_else(|| overflow("company fee"))?;
    Ok(RouteDetail {
        delivery_date: record.delivery_date.clone(),
        route: record.route.clone(),
        operator_id: record.operator_id.clone(),
        delivery_count: record.delivery_count,
        return_count: record.return_count,
        total_count,
        prices,
        operator_income,
        driver_income,
        company_fee,
    })
}

/// Folds records into per-driver summaries using an already-loaded resolver.
///
/// Records whose route is not registered price at zero and are listed in
/// [`DriverSummary::unpriced_routes`].
pub fn fold_records<'a, I>(records: I, resolver: &RateResolver) -> Result<Summaries>
where
    I: IntoIterator<Item = &'a daily_record::Model>,
{
    let mut summaries = Summaries::new();
    for record in records {
        let summary = summaries
            .entry(record.uid.clone())
            .or_insert_with(|| DriverSummary::empty(record));

        let key = route_key(&record.route, &record.operator_id);
        let prices = resolver.lookup_key(&key).unwrap_or_else(|| {
            let prices = missing_price(&key);
            summary.unpriced_routes.insert(key);
            prices
        });

        summary.accumulate(price_record(record, prices)?)?;
    }

    for summary in summaries.values_mut() {
        summary.route_details.sort_by(|a, b| {
            (&a.delivery_date, &a.route, &a.operator_id)
                .cmp(&(&b.delivery_date, &b.route, &b.operator_id))
        });
    }
    Ok(summaries)
}

/// Aggregates every daily record in `period`.
///
/// Records and the routes they reference are loaded under the policy's
/// timeout; the fold itself runs only once everything is in memory, so callers
/// never see a partial result.
///
/// # Errors
/// * [`Error::Timeout`] - loading exceeded `policy.query_timeout_secs`
/// * [`Error::UnpricedRoutes`] - a record has no route and the policy rejects that
/// * [`Error::Overflow`] - a total leaves the `i64` range
#[instrument(skip(db, period, policy), fields(period = %period))]
pub async fn aggregate(
    db: &DatabaseConnection,
    period: &Period,
    policy: &SettlementPolicy,
) -> Result<Summaries> {
    let load = async {
        let records = records_in_range(db, &period.start_date, &period.end_date).await?;
        let keys: Vec<String> = records
            .iter()
            .map(|r| route_key(&r.route, &r.operator_id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let resolver = RateResolver::preload(db, &keys).await?;
        Ok::<_, Error>((records, resolver))
    };

    let (records, resolver) = tokio::time::timeout(policy.query_timeout(), load)
        .await
        .map_err(|_| Error::Timeout {
            operation: "aggregate".to_string(),
            seconds: policy.query_timeout_secs,
        })??;

    let summaries = fold_records(&records, &resolver)?;
    info!(
        "Aggregated {} records against {} routes into {} driver summaries",
        records.len(),
        resolver.len(),
        summaries.len()
    );

    if policy.reject_unpriced_routes {
        let route_keys: Vec<String> = summaries
            .values()
            .flat_map(|s| s.unpriced_routes.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if !route_keys.is_empty() {
            return Err(Error::UnpricedRoutes { route_keys });
        }
    }
    Ok(summaries)
}

/// Aggregates `period` and returns the summary for one driver, if they have
/// any records in it.
pub async fn aggregate_driver(
    db: &DatabaseConnection,
    period: &Period,
    uid: &str,
    policy: &SettlementPolicy,
) -> Result<Option<DriverSummary>> {
    let mut summaries = aggregate(db, period, policy).await?;
    Ok(summaries.remove(uid))
}
