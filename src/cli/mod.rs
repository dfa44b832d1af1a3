//! Command-line interface - argument parsing, session resolution and dispatch.
//!
//! This is the calling boundary: it resolves the acting user once, performs the
//! role checks, and hands plain values to [`crate::core`].

/// Command implementations grouped by collection
pub mod commands;

use crate::{
    config::{Settings, database},
    core::{Session, user},
    entities::Role,
    errors::{Error, Result},
};
use clap::{Parser, Subcommand};
use sea_orm::DatabaseConnection;
use tracing::{debug, instrument};

/// Top-level arguments.
#[derive(Debug, Parser)]
#[command(name = "itkoo-settle", version, about = "Courier settlement back-office")]
pub struct Cli {
    /// Uid of the acting user
    #[arg(long = "as", global = true, env = "ITKOO_USER")]
    pub acting_uid: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Command groups.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register and list users
    #[command(subcommand)]
    User(commands::user::UserCommand),
    /// Register, delete and list priced routes
    #[command(subcommand)]
    Route(commands::route::RouteCommand),
    /// Enter daily delivery/return counts
    #[command(subcommand)]
    Record(commands::record::RecordCommand),
    /// Per-driver performance summary for a period
    Summary(commands::settlement::SummaryArgs),
    /// Compute, save, export and review final payouts
    #[command(subcommand)]
    Payout(commands::settlement::PayoutCommand),
}

/// Shared state for one CLI invocation.
pub struct CliContext {
    /// Database connection for all store operations
    pub database: DatabaseConnection,
    /// Loaded settlement settings
    pub settings: Settings,
    /// Acting user, when `--as` was given
    pub session: Option<Session>,
}

impl CliContext {
    /// Creates a context for one invocation.
    #[must_use]
    pub const fn new(
        database: DatabaseConnection,
        settings: Settings,
        session: Option<Session>,
    ) -> Self {
        Self {
            database,
            settings,
            session,
        }
    }

    /// The acting session, checked for `role`.
    pub fn require(&self, role: Role, action: &str) -> Result<&Session> {
        let session = self.session.as_ref().ok_or_else(|| Error::PermissionDenied {
            action: action.to_string(),
            required: role.as_str().to_string(),
        })?;
        session.require(role, action)?;
        Ok(session)
    }
}

/// Resolves `--as` into a session.
pub async fn resolve_session(
    db: &DatabaseConnection,
    acting_uid: Option<&str>,
) -> Result<Option<Session>> {
    let Some(uid) = acting_uid else {
        return Ok(None);
    };
    let found = user::get_user(db, uid)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            uid: uid.to_string(),
        })?;
    debug!("Acting as {} ({})", found.uid, found.role.as_str());
    Ok(Some(Session::from_user(found)))
}

/// Connects, ensures the schema, resolves the session and runs the command.
#[instrument(skip_all)]
pub async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let db = database::create_connection().await?;
    database::create_tables(&db).await?;
    let session = resolve_session(&db, cli.acting_uid.as_deref()).await?;
    let ctx = CliContext::new(db, settings, session);
    dispatch(&ctx, cli.command).await
}

/// Routes a parsed command to its handler.
pub async fn dispatch(ctx: &CliContext, command: Command) -> Result<()> {
    let output = match command {
        Command::User(cmd) => commands::user::run(ctx, cmd).await?,
        Command::Route(cmd) => commands::route::run(ctx, cmd).await?,
        Command::Record(cmd) => commands::record::run(ctx, cmd).await?,
        Command::Summary(args) => commands::settlement::summary(ctx, args).await?,
        Command::Payout(cmd) => commands::settlement::run(ctx, cmd).await?,
    };
    println!("{output}");
    Ok(())
}
