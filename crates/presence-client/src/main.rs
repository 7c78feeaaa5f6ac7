//! Presence watcher entry point
//!
//! Run with:
//! ```bash
//! PRESENCE_TOKEN=... PRESENCE_USER_ID=u1 PRESENCE_PROFILE_ID=p1 \
//! PRESENCE_WATCH_USERS=u2,u3 cargo run -p presence-client --bin presence-watch
//! ```
//!
//! Configuration is loaded from environment variables.

use presence_client::PresenceClient;
use presence_common::{try_init_tracing_with_config, PresenceConfig, TracingConfig};
use presence_core::Credentials;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = PresenceConfig::from_env();

    // Initialize tracing
    let tracing_config = match &config {
        Ok(config) => TracingConfig::for_environment(config.app.env),
        Err(_) => TracingConfig::default(),
    };
    if let Err(e) = try_init_tracing_with_config(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        error!(error = %e, "Presence watcher failed");
        std::process::exit(1);
    }
}

async fn run(config: PresenceConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        env = ?config.app.env,
        api = %config.api.base_url,
        channel = %config.channel.url,
        "Configuration loaded"
    );

    let credentials = Credentials::new(
        required("PRESENCE_TOKEN")?,
        required("PRESENCE_USER_ID")?,
        required("PRESENCE_PROFILE_ID")?,
    );

    let client = PresenceClient::from_config(&config)?;
    let mut updates = client.updates();

    if !client.init(credentials).await {
        warn!("Presence channel not open yet, retrying in the background");
    }

    let users = id_list("PRESENCE_WATCH_USERS");
    if !users.is_empty() {
        let statuses = client.subscribe_to_users(users).await;
        info!(count = statuses.len(), "Watching users");
    }

    let profiles = id_list("PRESENCE_WATCH_PROFILES");
    if !profiles.is_empty() {
        let statuses = client.subscribe_to_profiles(profiles).await;
        info!(count = statuses.len(), "Watching profiles");
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            change = updates.recv() => match change {
                Ok(change) => info!(
                    entity = %change.entity,
                    previous = ?change.previous,
                    status = %change.status,
                    "Presence changed"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Presence updates lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    client.shutdown();
    Ok(())
}

fn required(key: &'static str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing environment variable: {key}"))
}

/// Comma-separated ids from an optional variable
fn id_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}
