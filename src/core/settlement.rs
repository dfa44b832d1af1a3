//! Final payout persistence.
//!
//! Saving is an upsert keyed by driver and period: saving the same period again
//! replaces the earlier result. There is no version check, so when two admins
//! save the same period the later write wins.

use super::{keys::final_payout_key, payout::Settlement};
use crate::{
    entities::{FinalPayout, final_payout},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use tracing::{info, instrument};

/// Upserts the final payout for the settlement's driver and period.
#[instrument(skip(db, settlement), fields(uid = %settlement.summary.uid, period = %settlement.period))]
pub async fn save_final_payout(
    db: &DatabaseConnection,
    settlement: &Settlement,
) -> Result<final_payout::Model> {
    let summary = &settlement.summary;
    let period = &settlement.period;
    let deductions = &settlement.deductions;
    let id = final_payout_key(&summary.uid, &period.start_date, &period.end_date);

    let model = final_payout::ActiveModel {
        id: Set(id.clone()),
        uid: Set(summary.uid.clone()),
        email: Set(summary.email.clone()),
        name: Set(summary.name.clone()),
        start_date: Set(period.start_date.clone()),
        end_date: Set(period.end_date.clone()),
        routes: Set(join(&summary.routes)),
        operator_ids: Set(join(&summary.operator_ids)),
        total_delivery: Set(summary.total_delivery),
        total_return: Set(summary.total_return),
        total_count: Set(summary.total_count),
        operator_income: Set(summary.operator_income),
        driver_income: Set(summary.driver_income),
        company_fee: Set(summary.company_fee),
        ins_emp: Set(deductions.ins_emp),
        ins_ind: Set(deductions.ins_ind),
        rental: Set(deductions.rental),
        damage: Set(deductions.damage),
        etc: Set(deductions.etc),
        total_deduction: Set(settlement.total_deduction),
        freshback: Set(deductions.freshback),
        final_pay: Set(settlement.final_pay),
        created_at: Set(chrono::Utc::now()),
    };

    FinalPayout::insert(model)
        .on_conflict(
            OnConflict::column(final_payout::Column::Id)
                .update_columns([
                    final_payout::Column::Email,
                    final_payout::Column::Name,
                    final_payout::Column::Routes,
                    final_payout::Column::OperatorIds,
                    final_payout::Column::TotalDelivery,
                    final_payout::Column::TotalReturn,
                    final_payout::Column::TotalCount,
                    final_payout::Column::OperatorIncome,
                    final_payout::Column::DriverIncome,
                    final_payout::Column::CompanyFee,
                    final_payout::Column::InsEmp,
                    final_payout::Column::InsInd,
                    final_payout::Column::Rental,
                    final_payout::Column::Damage,
                    final_payout::Column::Etc,
                    final_payout::Column::TotalDeduction,
                    final_payout::Column::Freshback,
                    final_payout::Column::FinalPay,
                    final_payout::Column::CreatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    info!("Final payout {id} saved: {} won", settlement.final_pay);
    FinalPayout::find_by_id(id.clone())
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(id).into())
}

/// Reads back the saved payout for a driver and period.
pub async fn get_final_payout(
    db: &DatabaseConnection,
    uid: &str,
    start_date: &str,
    end_date: &str,
) -> Result<Option<final_payout::Model>> {
    FinalPayout::find_by_id(final_payout_key(uid, start_date, end_date))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All saved payouts for a driver, most recent period first.
pub async fn list_final_payouts(
    db: &DatabaseConnection,
    uid: &str,
) -> Result<Vec<final_payout::Model>> {
    FinalPayout::find()
        .filter(final_payout::Column::Uid.eq(uid))
        .order_by_desc(final_payout::Column::StartDate)
        .all(db)
        .await
        .map_err(Into::into)
}

fn join(values: &std::collections::BTreeSet<String>) -> String {
    values.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}
