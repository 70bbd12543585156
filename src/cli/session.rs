use anyhow::{anyhow, bail, Result};

use super::args::{SessionCliArgs, SessionCommand};
use crate::auth::{issue_session, SESSION_COOKIE};
use crate::config::Config;
use crate::db::{Database, SessionRepository, UserRepository};

pub fn handle_session_command(db: &Database, config: &Config, args: SessionCliArgs) -> Result<()> {
    match args.command {
        SessionCommand::Create { login } => {
            let login = login.trim().to_string();
            if login.is_empty() {
                bail!("Login must not be empty");
            }

            let ttl_hours = config.auth.session_ttl_hours;
            let issued = db.blocking(|conn| issue_session(conn, &login, ttl_hours))?;

            println!("Session created for {} ({})", issued.user.login, issued.user.id);
            println!("Expires: {}", issued.expires_at.to_rfc3339());
            println!("\nToken (shown once):\n{}", issued.token);
            println!(
                "\nSend it as `Authorization: Bearer <token>` or in the `{}` cookie.",
                SESSION_COOKIE
            );
            Ok(())
        }
        SessionCommand::Revoke { login } => {
            let revoked = db.blocking(|conn| {
                let user = UserRepository::get_by_login(conn, &login)?
                    .ok_or_else(|| anyhow!("No user with login '{}'", login))?;
                SessionRepository::delete_for_user(conn, &user.id)
            })?;

            println!("Revoked {} session(s) for {}", revoked, login);
            Ok(())
        }
    }
}
