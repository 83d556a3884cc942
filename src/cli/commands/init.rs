use clap::Subcommand;
use serde_json::json;

use crate::cli::config::*;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum InitCommands {
    #[command(about = "Initialize configuration directory")]
    Config {
        #[arg(long, help = "Register this backend URL as server 'default' and select it")]
        url: Option<String>,
    },
}

pub async fn handle(cmd: InitCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        InitCommands::Config { url } => {
            let dir = get_config_dir()?;
            std::fs::create_dir_all(dir.join("sessions"))?;

            let mut servers = load_server_config()?;
            let mut env_config = load_environment_config()?;
            if let Some(url) = url {
                servers
                    .servers
                    .insert("default".to_string(), ServerInfo::new(url, None, String::new()));
                env_config.current_server = Some("default".to_string());
            }
            save_server_config(&servers)?;
            save_environment_config(&env_config)?;

            output_success(
                &output_format,
                &format!("Configuration initialized in {}", dir.display()),
                Some(json!({ "config_dir": dir.display().to_string() })),
            )
        }
    }
}
