//! User entity - Drivers and administrators of the settlement desk.
//!
//! Keyed by the externally issued uid. Drivers appear in summaries and payouts,
//! administrators gate the back-office commands.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Capability level of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Back-office administrator
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Delivery driver
    #[sea_orm(string_value = "driver")]
    Driver,
}

impl Role {
    /// Lowercase name used in messages and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Driver => "driver",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "관리자" => Ok(Self::Admin),
            "driver" | "기사" => Ok(Self::Driver),
            other => Err(crate::errors::Error::validation(
                "role",
                format!("expected admin or driver, got `{other}`"),
            )),
        }
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Externally issued user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,
    /// Login email, shown next to the name on summaries
    pub email: String,
    /// Display name
    pub name: String,
    /// Internal staff number
    pub itkoo_id: String,
    /// Admin or driver
    pub role: Role,
    /// When the user was registered
    pub created_at: DateTimeUtc,
}

/// Users are joined by uid in application code, not via foreign keys.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
