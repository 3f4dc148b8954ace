//! Configuration management.

use clap::Subcommand;
use glimpse_core::ViewerConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration as JSON
    Show,
    /// Write the default configuration to the config path
    Init,
    /// Print the config file path
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = ViewerConfig::load_or_default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Init => {
            let path = ViewerConfig::default_path()
                .ok_or("could not determine a config directory for this platform")?;
            ViewerConfig::default().save(&path)?;
            println!("wrote {}", path.display());
        }
        ConfigAction::Path => {
            let path = ViewerConfig::default_path()
                .ok_or("could not determine a config directory for this platform")?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
