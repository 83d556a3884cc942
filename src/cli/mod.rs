pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "propman")]
#[command(about = "Propman CLI - property, asset and access management client")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Initialize configuration directory with required files")]
    Init {
        #[command(subcommand)]
        cmd: commands::init::InitCommands,
    },

    #[command(about = "Remote server management")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Authentication and token management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Properties")]
    Property {
        #[command(subcommand)]
        cmd: commands::property::PropertyCommands,
    },

    #[command(about = "Spaces (rooms, areas) within a property")]
    Space {
        #[command(subcommand)]
        cmd: commands::space::SpaceCommands,
    },

    #[command(about = "Assets within a space")]
    Asset {
        #[command(subcommand)]
        cmd: commands::asset::AssetCommands,
    },

    #[command(about = "Property features")]
    Feature {
        #[command(subcommand)]
        cmd: commands::feature::FeatureCommands,
    },

    #[command(about = "Image upload and splash management")]
    Image {
        #[command(subcommand)]
        cmd: commands::image::ImageCommands,
    },

    #[command(about = "PIN-based contractor access jobs")]
    Job {
        #[command(subcommand)]
        cmd: commands::job::JobCommands,
    },

    #[command(about = "Property ownership transfers")]
    Transfer {
        #[command(subcommand)]
        cmd: commands::transfer::TransferCommands,
    },

    #[command(about = "Property change history")]
    Changelog {
        #[command(subcommand)]
        cmd: commands::changelog::ChangelogCommands,
    },

    #[command(about = "Owner records")]
    Owner {
        #[command(subcommand)]
        cmd: commands::owner::OwnerCommands,
    },

    #[command(about = "Administration (admin role required)")]
    Admin {
        #[command(subcommand)]
        cmd: commands::admin::AdminCommands,
    },

    #[command(about = "Property reports")]
    Report {
        #[command(subcommand)]
        cmd: commands::report::ReportCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Init { cmd } => commands::init::handle(cmd, output_format).await,
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Property { cmd } => commands::property::handle(cmd, output_format).await,
        Commands::Space { cmd } => commands::space::handle(cmd, output_format).await,
        Commands::Asset { cmd } => commands::asset::handle(cmd, output_format).await,
        Commands::Feature { cmd } => commands::feature::handle(cmd, output_format).await,
        Commands::Image { cmd } => commands::image::handle(cmd, output_format).await,
        Commands::Job { cmd } => commands::job::handle(cmd, output_format).await,
        Commands::Transfer { cmd } => commands::transfer::handle(cmd, output_format).await,
        Commands::Changelog { cmd } => commands::changelog::handle(cmd, output_format).await,
        Commands::Owner { cmd } => commands::owner::handle(cmd, output_format).await,
        Commands::Admin { cmd } => commands::admin::handle(cmd, output_format).await,
        Commands::Report { cmd } => commands::report::handle(cmd, output_format).await,
    }
}
