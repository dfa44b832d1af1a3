//! User commands - `user add` and `user list`.

use crate::{
    cli::CliContext,
    core::user::{self, NewUser},
    entities::Role,
    errors::Result,
};
use clap::Subcommand;
use std::fmt::Write;
use tracing::info;

/// `user` subcommands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register or update a user
    Add {
        /// Login uid
        #[arg(long)]
        uid: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Internal staff id
        #[arg(long)]
        itkoo_id: String,
        /// `admin` or `driver` (관리자/기사 accepted)
        #[arg(long, default_value = "driver")]
        role: Role,
    },
    /// List registered users
    List {
        /// Only show drivers
        #[arg(long)]
        drivers: bool,
    },
}

/// Runs a `user` subcommand.
pub async fn run(ctx: &CliContext, command: UserCommand) -> Result<String> {
    match command {
        UserCommand::Add {
            uid,
            email,
            name,
            itkoo_id,
            role,
        } => {
            add(
                ctx,
                NewUser {
                    uid,
                    email,
                    name,
                    itkoo_id,
                    role,
                },
            )
            .await
        }
        UserCommand::List { drivers } => list(ctx, drivers).await,
    }
}

async fn add(ctx: &CliContext, new_user: NewUser) -> Result<String> {
    let db = &ctx.database;

    // An empty user table may be seeded without a session
    if user::count_users(db).await? == 0 {
        info!("Bootstrapping first user {}", new_user.uid);
    } else {
        ctx.require(Role::Admin, "user add")?;
    }

    let saved = user::register_user(db, new_user).await?;
    Ok(format!(
        "✅ Saved user {} <{}> as {} (staff id {})",
        saved.name,
        saved.email,
        saved.role.as_str(),
        saved.itkoo_id
    ))
}

async fn list(ctx: &CliContext, drivers_only: bool) -> Result<String> {
    ctx.require(Role::Admin, "user list")?;
    let db = &ctx.database;

    let users = if drivers_only {
        user::list_drivers(db).await?
    } else {
        user::list_users(db).await?
    };

    if users.is_empty() {
        return Ok("No users registered yet. Use `user add` to create one.".to_string());
    }

    let mut out = String::new();
    for u in &users {
        let _ = writeln!(
            out,
            "{:<16} {:<12} {:<28} {:<8} {}",
            u.uid,
            u.name,
            u.email,
            u.role.as_str(),
            u.itkoo_id
        );
    }
    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::{
        config::Settings,
        core::Session,
        errors::Error,
        test_utils::*,
    };

    fn new_user(uid: &str, role: Role) -> NewUser {
        NewUser {
            uid: uid.to_string(),
            email: format!("{uid}@example.com"),
            name: uid.to_string(),
            itkoo_id: format!("IT-{uid}"),
            role,
        }
    }

    #[tokio::test]
    async fn test_first_user_needs_no_session() -> Result<()> {
        let db = setup_test_db().await?;
        let ctx = CliContext::new(db, Settings::default(), None);

        let out = add(&ctx, new_user("boss", Role::Admin)).await?;
        assert!(out.contains("boss"));

        // Second registration without a session is refused
        let second = add(&ctx, new_user("kim", Role::Driver)).await;
        assert!(matches!(second, Err(Error::PermissionDenied { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_driver_cannot_list_users() -> Result<()> {
        let db = setup_test_db().await?;
        let driver = create_test_driver(&db, "u1", "Kim").await?;
        let ctx = CliContext::new(db, Settings::default(), Some(Session::from_user(driver)));

        assert!(matches!(
            list(&ctx, false).await,
            Err(Error::PermissionDenied { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_drivers_only() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_admin(&db, "admin1").await?;
        create_test_driver(&db, "u1", "Kim").await?;
        let ctx = CliContext::new(db, Settings::default(), Some(Session::from_user(admin)));

        let out = list(&ctx, true).await?;
        assert!(out.contains("u1"));
        assert!(!out.contains("admin1"));
        Ok(())
    }
}
