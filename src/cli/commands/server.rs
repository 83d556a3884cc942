use clap::Subcommand;
use serde_json::json;

use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Register remote server")]
    Add {
        #[arg(help = "Server URL")]
        url: String,
        #[arg(help = "Server name")]
        name: Option<String>,
        #[arg(long, help = "API key sent with every request")]
        api_key: Option<String>,
        #[arg(long, default_value = "", help = "Description")]
        description: String,
    },

    #[command(about = "List all servers")]
    List,

    #[command(about = "Show currently selected server")]
    Current,

    #[command(about = "Switch to server (persistent selection) or show current server")]
    Use {
        #[arg(help = "Server name to switch to")]
        name: Option<String>,
    },

    #[command(about = "Remove server from registry")]
    Delete {
        #[arg(help = "Server name to delete")]
        name: String,
    },

    #[command(about = "Health check specific server (defaults to current server)")]
    Ping {
        #[arg(help = "Server name to ping")]
        name: Option<String>,
    },
}

/// Host part of a URL, used as the default server name
fn default_name(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "default".to_string())
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Add {
            url,
            name,
            api_key,
            description,
        } => {
            url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
            let name = name.unwrap_or_else(|| default_name(&url));

            let mut config = load_server_config()?;
            if config.servers.contains_key(&name) {
                return Err(anyhow::anyhow!("Server '{}' already exists", name));
            }
            let info = ServerInfo::new(url, api_key, description);
            let url = info.url.clone();
            config.servers.insert(name.clone(), info);
            save_server_config(&config)?;

            // First server becomes current
            let mut env_config = load_environment_config()?;
            if env_config.current_server.is_none() {
                env_config.current_server = Some(name.clone());
                save_environment_config(&env_config)?;
            }

            output_success(
                &output_format,
                &format!("Server '{}' added ({})", name, url),
                Some(json!({ "name": name, "url": url })),
            )
        }
        ServerCommands::List => {
            let config = load_server_config()?;
            let env_config = load_environment_config()?;

            if config.servers.is_empty() {
                return output_empty_collection(&output_format, "servers", "No servers configured");
            }

            match output_format {
                OutputFormat::Json => {
                    let servers: Vec<_> = config
                        .servers
                        .iter()
                        .map(|(name, info)| {
                            json!({
                                "name": name,
                                "url": info.url,
                                "description": info.description,
                                "status": info.status,
                                "last_ping": info.last_ping,
                                "added_at": info.added_at,
                                "current": env_config.current_server.as_ref() == Some(name)
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "servers": servers }))?);
                }
                OutputFormat::Text => {
                    println!("{:<15} {:<35} {:<8} {}", "NAME", "URL", "STATUS", "DESCRIPTION");
                    println!("{}", "-".repeat(80));
                    for (name, info) in &config.servers {
                        let marker = if env_config.current_server.as_ref() == Some(name) { "*" } else { " " };
                        println!(
                            "{}{:<14} {:<35} {:<8} {}",
                            marker,
                            name,
                            info.url,
                            info.status.as_str(),
                            info.description
                        );
                    }
                }
            }
            Ok(())
        }
        ServerCommands::Current | ServerCommands::Use { name: None } => {
            let env_config = load_environment_config()?;
            match env_config.current_server {
                Some(name) => {
                    let config = load_server_config()?;
                    let info = config
                        .servers
                        .get(&name)
                        .ok_or_else(|| anyhow::anyhow!("Current server '{}' not found in configuration", name))?;
                    let details = json!({
                        "name": name,
                        "url": info.url,
                        "description": info.description,
                        "status": info.status
                    });
                    output_current_item(&output_format, "server", &name, details)
                }
                None => output_no_current_item(&output_format, "server"),
            }
        }
        ServerCommands::Use { name: Some(name) } => switch_current_item(
            &name,
            "server",
            |n| Ok(load_server_config()?.servers.contains_key(n)),
            |n| {
                let mut env_config = load_environment_config()?;
                env_config.current_server = Some(n.to_string());
                save_environment_config(&env_config)
            },
            &output_format,
        ),
        ServerCommands::Delete { name } => delete_item_with_current_check(
            &name,
            "server",
            |n| Ok(load_server_config()?.servers.contains_key(n)),
            |n| {
                let mut config = load_server_config()?;
                config.servers.remove(n);
                save_server_config(&config)?;
                let session = session_path(n)?;
                if session.exists() {
                    std::fs::remove_file(session)?;
                }
                Ok(())
            },
            |n| {
                let mut env_config = load_environment_config()?;
                if env_config.current_server.as_deref() == Some(n) {
                    env_config.current_server = None;
                    env_config.current_user = None;
                    save_environment_config(&env_config)?;
                }
                Ok(())
            },
            &output_format,
        ),
        ServerCommands::Ping { name } => {
            let name = resolve_target_item(
                name,
                || Ok(load_environment_config()?.current_server),
                "server",
            )?;
            let mut config = load_server_config()?;
            let info = config
                .servers
                .get_mut(&name)
                .ok_or_else(|| anyhow::anyhow!("Server '{}' not found", name))?;

            let status = ping_server(info).await;
            info.update_ping(status);
            let url = info.url.clone();
            save_server_config(&config)?;

            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({ "name": name, "url": url, "status": status }))?
                    );
                }
                OutputFormat::Text => println!("{} ({}): {}", name, url, status.as_str()),
            }

            if status == ServerStatus::Down {
                return Err(anyhow::anyhow!("Server '{}' is not responding", name));
            }
            Ok(())
        }
    }
}
