//! Settlement commands - `summary`, `payout compute`, `payout show` and
//! `payout history`.

use super::{CLI_LABELS, won};
use crate::{
    cli::CliContext,
    core::{
        Deductions, DriverSummary, Period, Settlement, aggregate, aggregate_driver,
        export::{self, format_thousands},
        settlement,
    },
    entities::{Role, final_payout},
    errors::{Error, Result},
};
use clap::{Args, Subcommand};
use std::{fmt::Write, path::PathBuf};
use tracing::info;

/// Arguments for `summary`.
#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// First day of the period (YYYY-MM-DD)
    #[arg(long)]
    pub start: String,
    /// Last day of the period, inclusive
    #[arg(long)]
    pub end: String,
    /// Only this driver
    #[arg(long)]
    pub driver: Option<String>,
    /// Also print every priced record
    #[arg(long)]
    pub details: bool,
}

/// Manually entered deductions and freshback credit, in won.
#[derive(Debug, Args)]
pub struct DeductionArgs {
    /// Employment insurance
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub ins_emp: i64,
    /// Industrial accident insurance
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub ins_ind: i64,
    /// Rental / transport support fee
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub rental: i64,
    /// Damage or loss
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub damage: i64,
    /// Miscellaneous deduction
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub etc: i64,
    /// Freshback credit, added to pay
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub freshback: i64,
}

impl From<DeductionArgs> for Deductions {
    fn from(args: DeductionArgs) -> Self {
        Self {
            ins_emp: args.ins_emp,
            ins_ind: args.ins_ind,
            rental: args.rental,
            damage: args.damage,
            etc: args.etc,
            freshback: args.freshback,
        }
    }
}

/// Driver and period selecting one payout.
#[derive(Debug, Args)]
pub struct PayoutTarget {
    /// Driver uid
    #[arg(long)]
    pub driver: String,
    /// First day of the period (YYYY-MM-DD)
    #[arg(long)]
    pub start: String,
    /// Last day of the period, inclusive
    #[arg(long)]
    pub end: String,
}

/// `payout` subcommands.
#[derive(Debug, Subcommand)]
pub enum PayoutCommand {
    /// Compute a driver's payout, optionally saving and exporting it
    Compute {
        #[command(flatten)]
        target: PayoutTarget,
        #[command(flatten)]
        deductions: DeductionArgs,
        /// Save the result as the final payout for the period
        #[arg(long)]
        save: bool,
        /// Write the settlement PDF, optionally to the given path
        #[arg(long, num_args = 0..=1, value_name = "PATH")]
        pdf: Option<Option<PathBuf>>,
    },
    /// Show a saved final payout
    Show {
        #[command(flatten)]
        target: PayoutTarget,
    },
    /// List a driver's saved final payouts
    History {
        /// Driver uid
        #[arg(long)]
        driver: String,
    },
}

/// Prints per-driver totals for a period.
pub async fn summary(ctx: &CliContext, args: SummaryArgs) -> Result<String> {
    let driver = scope_driver(ctx, args.driver, "summary")?;
    let period = Period::new(&args.start, &args.end)?;
    let policy = &ctx.settings.settlement;

    let summaries: Vec<DriverSummary> = match driver {
        Some(uid) => aggregate_driver(&ctx.database, &period, &uid, policy)
            .await?
            .into_iter()
            .collect(),
        None => aggregate(&ctx.database, &period, policy)
            .await?
            .into_values()
            .collect(),
    };

    if summaries.is_empty() {
        return Ok(format!("No daily records between {period}."));
    }

    let mut out = format!("📊 Settlement summary {period}\n");
    let mut grand_total: i64 = 0;
    for s in &summaries {
        grand_total = grand_total
            .checked_add(s.driver_income)
            .ok_or_else(|| Error::overflow("driver income total"))?;
        write_summary(&mut out, s, args.details);
    }
    let _ = write!(
        out,
        "\n{} drivers, driver income total {}",
        summaries.len(),
        won(grand_total)
    );
    Ok(out)
}

/// Runs a `payout` subcommand.
pub async fn run(ctx: &CliContext, command: PayoutCommand) -> Result<String> {
    match command {
        PayoutCommand::Compute {
            target,
            deductions,
            save,
            pdf,
        } => compute(ctx, target, deductions.into(), save, pdf).await,
        PayoutCommand::Show { target } => show(ctx, target).await,
        PayoutCommand::History { driver } => history(ctx, driver).await,
    }
}

async fn compute(
    ctx: &CliContext,
    target: PayoutTarget,
    deductions: Deductions,
    save: bool,
    pdf: Option<Option<PathBuf>>,
) -> Result<String> {
    ctx.require(Role::Admin, "payout compute")?;
    let period = Period::new(&target.start, &target.end)?;
    let policy = &ctx.settings.settlement;

    let summary = aggregate_driver(&ctx.database, &period, &target.driver, policy)
        .await?
        .ok_or_else(|| Error::NotFound {
            what: format!(
                "Daily records for driver '{}' between {period}",
                target.driver
            ),
        })?;

    let computed = Settlement::compute(period, summary, deductions, policy)?;
    let mut out = settlement_text(&computed);

    if save {
        let saved = settlement::save_final_payout(&ctx.database, &computed).await?;
        let _ = write!(out, "\n✅ Saved final payout {}", saved.id);
    }
    if let Some(path) = pdf {
        let written = export::write_settlement_document(&computed, &ctx.settings.export, path)?;
        let _ = write!(out, "\n✅ Settlement document written to {}", written.display());
    }
    info!(
        "Computed payout for {}: {}",
        computed.summary.uid, computed.final_pay
    );
    Ok(out)
}

async fn show(ctx: &CliContext, target: PayoutTarget) -> Result<String> {
    let uid = scope_driver(ctx, Some(target.driver), "payout show")?.unwrap_or_default();
    let period = Period::new(&target.start, &target.end)?;

    let saved =
        settlement::get_final_payout(&ctx.database, &uid, &period.start_date, &period.end_date)
            .await?;
    let saved = saved.ok_or_else(|| Error::NotFound {
        what: format!("Saved payout for '{uid}' for {period}"),
    })?;
    Ok(payout_text(&saved))
}

async fn history(ctx: &CliContext, driver: String) -> Result<String> {
    let uid = scope_driver(ctx, Some(driver), "payout history")?.unwrap_or_default();
    let payouts = settlement::list_final_payouts(&ctx.database, &uid).await?;
    if payouts.is_empty() {
        return Ok(format!("No saved payouts for '{uid}'."));
    }

    let mut out = String::new();
    for p in &payouts {
        let _ = writeln!(
            out,
            "{} ~ {}  driver income {:>14}  deductions {:>14}  final {:>14}",
            p.start_date,
            p.end_date,
            won(p.driver_income),
            won(p.total_deduction),
            won(p.final_pay)
        );
    }
    Ok(out.trim_end().to_string())
}

/// Admins may target any driver. Drivers may only target themselves and
/// default to themselves when no driver is given.
fn scope_driver(
    ctx: &CliContext,
    requested: Option<String>,
    action: &str,
) -> Result<Option<String>> {
    let session = ctx.require(Role::Driver, action)?;
    if session.role == Role::Admin {
        return Ok(requested);
    }
    match requested {
        Some(uid) if uid != session.uid => Err(Error::PermissionDenied {
            action: format!("{action} for another driver"),
            required: Role::Admin.as_str().to_string(),
        }),
        _ => Ok(Some(session.uid.clone())),
    }
}

fn write_summary(out: &mut String, s: &DriverSummary, details: bool) {
    let _ = writeln!(out, "\n👤 {} <{}> ({})", s.name, s.email, s.uid);
    let _ = writeln!(
        out,
        "   routes: {}  operators: {}",
        join(&s.routes),
        join(&s.operator_ids)
    );
    let _ = writeln!(
        out,
        "   units: {} delivered + {} returned = {}",
        s.total_delivery, s.total_return, s.total_count
    );
    let _ = writeln!(
        out,
        "   operator income {} / driver income {} / company fee {}",
        won(s.operator_income),
        won(s.driver_income),
        won(s.company_fee)
    );
    if !s.unpriced_routes.is_empty() {
        let _ = writeln!(
            out,
            "   ⚠️ unregistered routes priced at 0: {}",
            join(&s.unpriced_routes)
        );
    }
    if details {
        for d in &s.route_details {
            let _ = writeln!(
                out,
                "   - {} {} / {}: {} units x {} = {}",
                d.delivery_date,
                d.route,
                d.operator_id,
                d.total_count,
                won(d.prices.driver_unit_price),
                won(d.driver_income)
            );
        }
    }
}

fn settlement_text(settlement: &Settlement) -> String {
    let s = &settlement.summary;
    let mut out = format!(
        "💰 Payout for {} <{}> {}\n",
        s.name, s.email, settlement.period
    );
    for (item, amount) in export::settlement_rows(settlement, &CLI_LABELS) {
        let _ = writeln!(out, "   {item:<22} {amount:>14}");
    }
    if !s.unpriced_routes.is_empty() {
        let _ = writeln!(
            out,
            "   ⚠️ unregistered routes priced at 0: {}",
            join(&s.unpriced_routes)
        );
    }
    out.trim_end().to_string()
}

fn payout_text(p: &final_payout::Model) -> String {
    let labels = &CLI_LABELS;
    let rows = [
        (labels.total_count, format_thousands(p.total_count)),
        (labels.driver_income, won(p.driver_income)),
        (labels.ins_emp, won(p.ins_emp)),
        (labels.ins_ind, won(p.ins_ind)),
        (labels.rental, won(p.rental)),
        (labels.damage, won(p.damage)),
        (labels.etc, won(p.etc)),
        ("Total deduction", won(p.total_deduction)),
        (labels.freshback, won(p.freshback)),
        (labels.final_pay, won(p.final_pay)),
    ];
    let mut out = format!(
        "📄 Saved payout {} <{}> {} ~ {} (saved {})\n",
        p.name,
        p.email,
        p.start_date,
        p.end_date,
        p.created_at.format("%Y-%m-%d %H:%M")
    );
    for (item, value) in rows {
        let _ = writeln!(out, "   {item:<22} {value:>14}");
    }
    out.trim_end().to_string()
}

fn join(values: &std::collections::BTreeSet<String>) -> String {
    values.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
