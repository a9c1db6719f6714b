//! Configuration management commands.

use clap::Subcommand;
use tickbridge_core::BridgeConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Key: poll_interval_secs, due_soon_minutes, include_completed
        key: String,
        /// New value
        value: String,
    },
    /// Print the configuration file path
    Path,
}

pub fn run(action: ConfigAction) -> super::CliResult {
    match action {
        ConfigAction::Show => {
            let config = BridgeConfig::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = BridgeConfig::load()?;
            match key.as_str() {
                "poll_interval_secs" => config.poll_interval_secs = value.parse()?,
                "due_soon_minutes" => config.due_soon_minutes = value.parse()?,
                "include_completed" => config.include_completed = value.parse()?,
                other => return Err(format!("unknown configuration key: {other}").into()),
            }
            let config = config.normalized();
            config.save()?;
            println!("{key} = {value}");
        }
        ConfigAction::Path => println!("{}", BridgeConfig::config_path()?.display()),
    }
    Ok(())
}
