//! Route entity - A priced route/operator pairing.
//!
//! The primary key is the normalised route key (see [`crate::core::keys::route_key`]).
//! Prices are whole won per unit (delivery or return).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a route is a driver's regular route or a backup assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    /// Regular route
    #[sea_orm(string_value = "fixed")]
    Fixed,
    /// Backup route
    #[sea_orm(string_value = "backup")]
    Backup,
}

/// Day or night designation shared by routes and daily records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    /// Day shift (주간)
    #[sea_orm(string_value = "day")]
    Day,
    /// Night shift (야간)
    #[sea_orm(string_value = "night")]
    Night,
}

impl RouteType {
    /// Lowercase name used in messages and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Backup => "backup",
        }
    }
}

impl Shift {
    /// Lowercase name used in messages and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Night => "night",
        }
    }
}

impl std::str::FromStr for RouteType {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" | "고정" => Ok(Self::Fixed),
            "backup" | "백업" => Ok(Self::Backup),
            other => Err(crate::errors::Error::validation(
                "route_type",
                format!("expected fixed or backup, got `{other}`"),
            )),
        }
    }
}

impl std::str::FromStr for Shift {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "주간" => Ok(Self::Day),
            "night" | "야간" => Ok(Self::Night),
            other => Err(crate::errors::Error::validation(
                "shift",
                format!("expected day or night, got `{other}`"),
            )),
        }
    }
}

/// Route database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "routes")]
pub struct Model {
    /// `uppercase(lowercase(route)_lowercase(operator_id))`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Route code as registered (trimmed)
    pub route: String,
    /// Operator account id as registered (trimmed)
    pub operator_id: String,
    /// Fixed or backup
    pub route_type: RouteType,
    /// Day or night
    pub shift: Shift,
    /// Won paid to the driver per unit
    pub driver_unit_price: i64,
    /// Won received from the operator per unit
    pub operator_unit_price: i64,
    /// Date (`YYYY-MM-DD`) the prices take effect
    pub start_date: String,
    /// When the route was last written
    pub created_at: DateTimeUtc,
}

/// Daily records reference routes by key only; deletion does not cascade.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
