use crate::{
    api::{self, rate_limit::RateLimit, Services},
    auth::{random_secret, Credentials, TokenKeys},
    cli::telemetry,
    lot::SlotStore,
};
use anyhow::{Context, Result};
use bcrypt::DEFAULT_COST;
use secrecy::SecretString;
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub slots: usize,
    pub admin_username: String,
    pub admin_password: SecretString,
    pub jwt_secret: Option<SecretString>,
    pub token_ttl: Duration,
    pub global_rate_limit: NonZeroU32,
    pub user_rate_limit: NonZeroU32,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the admin password cannot be hashed or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let port = args.port;

    // hashing at DEFAULT_COST blocks
    let services = tokio::task::spawn_blocking(move || services(args, DEFAULT_COST))
        .await
        .context("Credential seeding task failed")??;

    let result = api::new(port, services).await;

    telemetry::shutdown_tracer();

    result
}

fn services(args: Args, cost: u32) -> Result<Services> {
    let mut credentials = Credentials::default();
    credentials
        .insert(&args.admin_username, &args.admin_password, cost)
        .context("Failed to hash admin password")?;

    let jwt_secret = args.jwt_secret.unwrap_or_else(|| {
        warn!("No JWT secret configured, using a random one; tokens will not survive a restart");
        random_secret()
    });

    Ok(Services {
        lot: Arc::new(SlotStore::new(args.slots)),
        credentials: Arc::new(credentials),
        tokens: Arc::new(TokenKeys::new(&jwt_secret, args.token_ttl)),
        client_limit: Arc::new(RateLimit::per_hour("client", args.global_rate_limit)),
        user_limit: Arc::new(RateLimit::per_minute("user", args.user_rate_limit)),
    })
}

fn startup_entries(args: &Args) -> [(&'static str, String); 7] {
    [
        ("listen", format!("tcp:{}", args.port)),
        ("slots", args.slots.to_string()),
        ("admin_username", args.admin_username.clone()),
        (
            "jwt_secret",
            if args.jwt_secret.is_some() {
                "configured".to_string()
            } else {
                "random".to_string()
            },
        ),
        ("token_ttl", format!("{}s", args.token_ttl.as_secs())),
        ("global_rate_limit", format!("{}/hour", args.global_rate_limit)),
        ("user_rate_limit", format!("{}/minute", args.user_rate_limit)),
    ]
}

fn log_startup_args(args: &Args) {
    let entries = startup_entries(args);
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

    let mut message = format!("{}\n\nStartup configuration:", valet_banner());
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn valet_banner() -> String {
    VALET_BANNER.replace(
        "{VERSION}",
        &format!(
            " - {} - {}",
            env!("CARGO_PKG_VERSION"),
            short_commit(crate::GIT_COMMIT_HASH)
        ),
    )
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}

const VALET_BANNER: &str = r"
  +---+---+---+---+---+
  | P |   |   |   |   |
  +---+---+---+---+---+  V A L E T {VERSION}";
