//! Signed-in user for CLI runs.
//!
//! The user id is kept in the local key-value store; the id token lives in
//! the OS keyring.

use momentum_core::storage::{load_json, save_json};
use momentum_core::{KeyValueStore, UserScope};

const USER_KEY: &str = "sessionUserId";
const KEYRING_SERVICE: &str = "momentum";
const TOKEN_KEY: &str = "id_token";

fn token_entry() -> keyring::Result<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, TOKEN_KEY)
}

/// The stored session, if any. An unreadable keyring yields a scope without
/// a token.
pub fn current(storage: &dyn KeyValueStore) -> Result<Option<UserScope>, Box<dyn std::error::Error>> {
    let Some(user_id) = load_json::<String>(storage, USER_KEY)? else {
        return Ok(None);
    };
    let scope = UserScope::new(user_id);
    match token_entry().and_then(|entry| entry.get_password()) {
        Ok(token) => Ok(Some(scope.with_token(token))),
        Err(keyring::Error::NoEntry) => Ok(Some(scope)),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read id token from keyring");
            Ok(Some(scope))
        }
    }
}

pub fn sign_in(
    storage: &dyn KeyValueStore,
    user_id: &str,
    id_token: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    if user_id.trim().is_empty() {
        return Err("--user-id must not be empty".into());
    }
    match id_token {
        Some(token) => token_entry()?.set_password(token)?,
        None => forget_token(),
    }
    save_json(storage, USER_KEY, user_id)?;
    tracing::info!(user = user_id, "Stored session");
    Ok(())
}

/// Forget the stored user and token. The next habit command starts signed
/// out, with nothing carried over from the previous user.
///
/// A keyring that cannot be reached is logged and does not block sign-out.
pub fn sign_out(storage: &dyn KeyValueStore) -> Result<(), Box<dyn std::error::Error>> {
    storage.remove(USER_KEY)?;
    forget_token();
    tracing::info!("Cleared session");
    Ok(())
}

fn forget_token() {
    match token_entry().and_then(|entry| entry.delete_credential()) {
        Ok(()) | Err(keyring::Error::NoEntry) => {}
        Err(e) => tracing::warn!(error = %e, "Could not remove id token from keyring"),
    }
}
