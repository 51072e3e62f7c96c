//! One-time bot identity resolution.
//!
//! The bridge needs its own user id to suppress self-authored posts. It is
//! resolved once at startup; failure is fatal, since without it every post
//! the bridge triggers downstream could echo back through it.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;

#[derive(Debug, Deserialize)]
struct Me {
    id: String,
}

/// Resolve the bot's own user id via `GET <base>/api/v4/users/me`.
pub async fn resolve_bot_id(client: &Client, config: &Config) -> Result<String> {
    let url = format!("{}/api/v4/users/me", config.base_url);

    let response = client
        .get(&url)
        .timeout(config.request_timeout)
        .bearer_auth(&config.bot_token)
        .send()
        .await
        .context("Identity request failed")?;

    let status = response.status();
    if !status.is_success() {
        bail!("identity endpoint returned {status}");
    }

    let me: Me = response
        .json()
        .await
        .context("Failed to decode identity response")?;

    Ok(me.id)
}
