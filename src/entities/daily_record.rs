//! Daily record entity - One driver's counts on one route for one date.
//!
//! Append-only: the primary key is the record identity key and rows are never
//! updated or deleted once written.

use super::route::Shift;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Daily record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_records")]
pub struct Model {
    /// `{uid}|{date}|{lowercase(operator_id)}|{lowercase(route)}`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Driver uid
    #[sea_orm(indexed)]
    pub uid: String,
    /// Driver email at the time of entry
    pub email: String,
    /// Driver display name at the time of entry
    pub name: String,
    /// Delivery date as `YYYY-MM-DD`; range queries compare the string
    #[sea_orm(indexed)]
    pub delivery_date: String,
    /// Operator account id, lowercased
    pub operator_id: String,
    /// Route code, lowercased
    pub route: String,
    /// Day or night
    pub shift: Shift,
    /// Delivered units
    pub delivery_count: i64,
    /// Returned units
    pub return_count: i64,
    /// `delivery_count + return_count`
    pub total_count: i64,
    /// When the record was written
    pub created_at: DateTimeUtc,
}

/// Daily records join routes by computed key in the aggregation pass.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
