//! CLI subcommand implementations.

pub mod agenda;
pub mod auth;
pub mod config;
pub mod project;
pub mod task;
pub mod watch;

use tickbridge_core::ticktick::oauth;
use tickbridge_core::TickTickClient;

pub(crate) type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Build a runtime for commands that call into the async core.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn std::error::Error>> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Client carrying the stored access token, refreshed when stale.
pub(crate) fn authenticated_client(
    rt: &tokio::runtime::Runtime,
) -> Result<TickTickClient, Box<dyn std::error::Error>> {
    let token = rt
        .block_on(oauth::access_token())
        .map_err(|e| format!("{e}. Run `tickbridge auth login` first."))?;
    Ok(TickTickClient::new(token))
}
