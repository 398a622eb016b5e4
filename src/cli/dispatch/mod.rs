use crate::cli::{
    actions::{server::Args, Action},
    commands::{auth, limits, ARG_PORT, ARG_SLOTS},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{num::NonZeroU32, time::Duration};

fn non_zero(matches: &clap::ArgMatches, id: &str) -> Result<NonZeroU32> {
    matches
        .get_one::<u32>(id)
        .copied()
        .and_then(NonZeroU32::new)
        .with_context(|| format!("--{id} must be greater than zero"))
}

/// # Errors
/// Returns an error if required arguments are missing or out of range.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let slots = matches
        .get_one::<u64>(ARG_SLOTS)
        .copied()
        .context("missing required argument: --slots")?;
    let slots = usize::try_from(slots).context("--slots does not fit in memory")?;

    let admin_username = matches
        .get_one::<String>(auth::ARG_ADMIN_USERNAME)
        .cloned()
        .context("missing required argument: --admin-username")?;
    let admin_password = matches
        .get_one::<String>(auth::ARG_ADMIN_PASSWORD)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --admin-password")?;
    let jwt_secret = matches
        .get_one::<String>(auth::ARG_JWT_SECRET)
        .cloned()
        .map(SecretString::from);

    let token_ttl = matches
        .get_one::<u64>(auth::ARG_TOKEN_TTL)
        .copied()
        .map(Duration::from_secs)
        .context("missing required argument: --token-ttl")?;

    Ok(Action::Server(Args {
        port,
        slots,
        admin_username,
        admin_password,
        jwt_secret,
        token_ttl,
        global_rate_limit: non_zero(matches, limits::ARG_GLOBAL_RATE_LIMIT)?,
        user_rate_limit: non_zero(matches, limits::ARG_USER_RATE_LIMIT)?,
    }))
}
