//! Route commands - `route upsert`, `route delete` and `route list`.

use super::won;
use crate::{
    cli::CliContext,
    core::route::{self, RouteInput},
    entities::{Role, RouteType, Shift},
    errors::{Error, Result},
};
use clap::Subcommand;
use std::fmt::Write;

/// `route` subcommands.
#[derive(Debug, Subcommand)]
pub enum RouteCommand {
    /// Register a route or replace its prices
    Upsert {
        /// Route code
        #[arg(long)]
        route: String,
        /// Operator account id
        #[arg(long)]
        operator: String,
        /// `fixed` or `backup` (고정/백업 accepted)
        #[arg(long = "type", default_value = "fixed")]
        route_type: RouteType,
        /// `day` or `night` (주간/야간 accepted)
        #[arg(long, default_value = "day")]
        shift: Shift,
        /// Won paid to the driver per unit
        #[arg(long)]
        driver_price: i64,
        /// Won received from the operator per unit
        #[arg(long)]
        operator_price: Option<i64>,
        /// Date the prices take effect (YYYY-MM-DD)
        #[arg(long)]
        start_date: String,
    },
    /// Delete a route. Existing records then price at zero.
    Delete {
        /// Route code
        #[arg(long)]
        route: String,
        /// Operator account id
        #[arg(long)]
        operator: String,
    },
    /// List registered routes
    List,
}

/// Runs a `route` subcommand. All route commands are admin-only.
pub async fn run(ctx: &CliContext, command: RouteCommand) -> Result<String> {
    let db = &ctx.database;
    match command {
        RouteCommand::Upsert {
            route,
            operator,
            route_type,
            shift,
            driver_price,
            operator_price,
            start_date,
        } => {
            ctx.require(Role::Admin, "route upsert")?;
            let saved = route::upsert_route(
                db,
                RouteInput {
                    route,
                    operator_id: operator,
                    route_type,
                    shift,
                    driver_unit_price: driver_price,
                    operator_unit_price: operator_price,
                    start_date,
                },
            )
            .await?;
            Ok(format!(
                "✅ Route {} saved: driver {}, operator {} per unit from {}",
                saved.id,
                won(saved.driver_unit_price),
                won(saved.operator_unit_price),
                saved.start_date
            ))
        }
        RouteCommand::Delete { route, operator } => {
            ctx.require(Role::Admin, "route delete")?;
            if !route::delete_route(db, &route, &operator).await? {
                return Err(Error::RouteNotRegistered {
                    route,
                    operator_id: operator,
                });
            }
            Ok(format!("✅ Deleted route {route} / {operator}"))
        }
        RouteCommand::List => {
            ctx.require(Role::Admin, "route list")?;
            let routes = route::list_routes(db).await?;
            if routes.is_empty() {
                return Ok("No routes registered yet. Use `route upsert` to add one.".to_string());
            }
            let mut out = String::new();
            for r in &routes {
                let _ = writeln!(
                    out,
                    "{:<20} {}/{} driver {:>12}  operator {:>12}  from {}",
                    r.id,
                    r.route_type.as_str(),
                    r.shift.as_str(),
                    won(r.driver_unit_price),
                    won(r.operator_unit_price),
                    r.start_date
                );
            }
            Ok(out.trim_end().to_string())
        }
    }
}
