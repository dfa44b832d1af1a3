//! Final payout entity - The persisted settlement of one driver for one period.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Final payout database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "final_payouts")]
pub struct Model {
    /// `{uid}|{start_date}~{end_date}`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(indexed)]
    pub uid: String,
    pub email: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    /// Comma-separated distinct routes driven in the period
    pub routes: String,
    /// Comma-separated distinct operator ids used in the period
    pub operator_ids: String,
    pub total_delivery: i64,
    pub total_return: i64,
    pub total_count: i64,
    pub operator_income: i64,
    pub driver_income: i64,
    pub company_fee: i64,
    pub ins_emp: i64,
    pub ins_ind: i64,
    pub rental: i64,
    pub damage: i64,
    pub etc: i64,
    /// Sum of the five deductions above; freshback is not included
    pub total_deduction: i64,
    pub freshback: i64,
    /// `driver_income - total_deduction + freshback`
    pub final_pay: i64,
    /// When this period was last saved
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
