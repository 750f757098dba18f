use clap::Subcommand;
use momentum_core::Config;

use super::{open_storage, CliResult};
use crate::session;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in as a user
    Login {
        /// User id the habits are stored under
        #[arg(long)]
        user_id: String,
        /// ID token presented to the remote store
        #[arg(long)]
        id_token: Option<String>,
    },
    /// Remove the stored session
    Logout,
    /// Check authentication status
    Status,
}

pub fn run(action: AuthAction) -> CliResult {
    let config = Config::load()?;
    let storage = open_storage(&config)?;

    match action {
        AuthAction::Login { user_id, id_token } => {
            session::sign_in(&*storage, &user_id, id_token.as_deref())?;
            println!("Signed in as {user_id}");
        }
        AuthAction::Logout => {
            session::sign_out(&*storage)?;
            println!("Signed out");
        }
        AuthAction::Status => match session::current(&*storage)? {
            Some(scope) => println!(
                "signed in as {} ({})",
                scope.user_id,
                if scope.id_token.is_some() {
                    "token stored"
                } else {
                    "no token"
                }
            ),
            None => println!("not signed in"),
        },
    }
    Ok(())
}
