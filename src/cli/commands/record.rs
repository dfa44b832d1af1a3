//! Daily record commands - `record add` (admin) and `record submit` (driver).

use super::won;
use crate::{
    cli::CliContext,
    core::{
        record::{self, RecordEntry},
        resolve_rate,
    },
    entities::{Role, Shift, daily_record},
    errors::{Error, Result},
};
use clap::{Args, Subcommand};

/// Counts shared by both entry forms.
#[derive(Debug, Args)]
pub struct EntryArgs {
    /// Delivery date (YYYY-MM-DD)
    #[arg(long)]
    pub date: String,
    /// Operator account id
    #[arg(long)]
    pub operator: String,
    /// Route code
    #[arg(long)]
    pub route: String,
    /// `day` or `night` (주간/야간 accepted)
    #[arg(long, default_value = "day")]
    pub shift: Shift,
    /// Delivered units
    #[arg(long, default_value_t = 0)]
    pub delivery: i64,
    /// Returned units
    #[arg(long = "return", default_value_t = 0)]
    pub returns: i64,
}

impl From<EntryArgs> for RecordEntry {
    fn from(args: EntryArgs) -> Self {
        Self {
            date: args.date,
            operator_id: args.operator,
            route: args.route,
            shift: Some(args.shift),
            delivery_count: args.delivery,
            return_count: args.returns,
        }
    }
}

/// `record` subcommands.
#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    /// Enter counts on behalf of a driver (admin)
    Add {
        /// Driver uid
        #[arg(long)]
        driver: String,
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Enter your own counts (driver)
    Submit {
        #[command(flatten)]
        entry: EntryArgs,
    },
}

/// Runs a `record` subcommand.
pub async fn run(ctx: &CliContext, command: RecordCommand) -> Result<String> {
    let db = &ctx.database;
    let saved = match command {
        RecordCommand::Add { driver, entry } => {
            let session = ctx.require(Role::Admin, "record add")?;
            record::record_for_driver(db, session, &driver, entry.into()).await?
        }
        RecordCommand::Submit { entry } => {
            let session = ctx.require(Role::Driver, "record submit")?;
            record::submit_own_record(db, session, entry.into()).await?
        }
    };

    let prices = resolve_rate(db, &saved.route, &saved.operator_id).await?;
    let driver_income = saved
        .total_count
        .checked_mul(prices.driver_unit_price)
        .ok_or_else(|| Error::overflow("driver income"))?;
    Ok(saved_message(&saved, driver_income))
}

fn saved_message(saved: &daily_record::Model, driver_income: i64) -> String {
    format!(
        "✅ Recorded {} on {} ({} / {}, {}): {} delivered + {} returned = {}, driver income {}",
        saved.name,
        saved.delivery_date,
        saved.route,
        saved.operator_id,
        saved.shift.as_str(),
        saved.delivery_count,
        saved.return_count,
        saved.total_count,
        won(driver_income)
    )
}
