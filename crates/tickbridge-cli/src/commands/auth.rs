//! Authentication commands: OAuth login, logout, status.

use clap::Subcommand;
use tickbridge_core::ticktick::oauth;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Authenticate with TickTick via the browser OAuth flow
    Login {
        /// OAuth client ID (stored for later refreshes)
        #[arg(long)]
        client_id: Option<String>,
        /// OAuth client secret
        #[arg(long)]
        client_secret: Option<String>,
    },
    /// Remove stored tokens
    Logout,
    /// Check authentication status
    Status,
}

pub fn run(action: AuthAction) -> super::CliResult {
    match action {
        AuthAction::Login {
            client_id,
            client_secret,
        } => {
            if let (Some(id), Some(secret)) = (&client_id, &client_secret) {
                oauth::store_credentials(id, secret)?;
            }
            let config = oauth::OAuthConfig::from_keyring()?;
            let rt = super::runtime()?;
            rt.block_on(oauth::authorize(&config))?;
            println!("TickTick authenticated");
        }
        AuthAction::Logout => {
            oauth::clear_tokens()?;
            println!("TickTick disconnected");
        }
        AuthAction::Status => match oauth::load_tokens() {
            Some(tokens) if !oauth::is_expired(&tokens) => println!("authenticated"),
            Some(_) => println!("token expired (will refresh on next use)"),
            None => println!("not authenticated"),
        },
    }
    Ok(())
}
