use clap::Subcommand;
use serde_json::json;

use crate::auth::Session;
use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::models::ProfileUpdate;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the current server")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password (falls back to PROPMAN_PASSWORD, then a prompt that echoes input)")]
        password: Option<String>,
    },

    #[command(about = "Logout from the current server")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Refresh authentication token")]
    Refresh,

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "Register new user")]
    Register {
        #[arg(help = "Email address")]
        email: String,
        #[arg(help = "Full name")]
        full_name: String,
        #[arg(long, help = "Password (falls back to PROPMAN_PASSWORD, then a prompt that echoes input)")]
        password: Option<String>,
    },

    #[command(about = "Send a password reset email")]
    ResetPassword {
        #[arg(help = "Email address")]
        email: String,
    },

    #[command(about = "Change the password of the signed-in user")]
    Passwd {
        #[arg(long, help = "Current password (falls back to PROPMAN_PASSWORD, then a prompt that echoes input)")]
        current: Option<String>,
        #[arg(long = "new", help = "New password (will prompt if not provided; the prompt echoes input)")]
        new_password: Option<String>,
    },

    #[command(about = "Update profile fields of the signed-in user")]
    Profile {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

fn session_json(server: &str, session: &Session) -> serde_json::Value {
    json!({
        "server": server,
        "user_id": session.user_id,
        "email": session.email,
        "role": session.role(),
        "expires_at": session.expires_at,
        "expired": session.is_expired(0),
    })
}

fn remember_user(email: Option<String>) -> anyhow::Result<()> {
    let mut env_config = load_environment_config()?;
    env_config.current_user = email;
    save_environment_config(&env_config)
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (server, _) = current_server()?;
    let client = connect()?;
    let auth = client.auth();

    match cmd {
        AuthCommands::Login { email, password } => {
            let password = resolve_password(password, "Password")?;
            let session = auth.login(&email, &password).await?;
            remember_user(session.email.clone())?;
            output_success(
                &output_format,
                &format!("Logged in to '{}' as {}", server, session.email.as_deref().unwrap_or(&email)),
                Some(session_json(&server, &session)),
            )
        }
        AuthCommands::Logout => {
            auth.logout().await?;
            remember_user(None)?;
            output_success(&output_format, &format!("Logged out of '{}'", server), None)
        }
        AuthCommands::Status => match auth.session().await? {
            Some(session) => output_value(&output_format, &session_json(&server, &session), |_| {
                println!("Server:  {}", server);
                println!("User:    {}", session.email.as_deref().unwrap_or("-"));
                if let Some(role) = session.role() {
                    println!("Role:    {}", role);
                }
                let state = if session.is_expired(0) { "expired (will refresh on next call)" } else { "valid" };
                println!("Token:   {} until {}", state, session.expires_at.format("%Y-%m-%d %H:%M UTC"));
            }),
            None => output_value(
                &output_format,
                &json!({ "server": server, "authenticated": false }),
                |_| println!("Not logged in to '{}'", server),
            ),
        },
        AuthCommands::Refresh => {
            let session = auth.refresh().await?;
            output_success(
                &output_format,
                &format!("Token refreshed, valid until {}", session.expires_at.format("%Y-%m-%d %H:%M UTC")),
                Some(session_json(&server, &session)),
            )
        }
        AuthCommands::Whoami => {
            let user = client.users().me().await?;
            output_value(&output_format, &user, |u| {
                println!("{} <{}>", u.display_name(), u.email);
                println!("Role:  {}", u.role);
                println!("Phone: {}", or_dash(u.phone.as_deref()));
                println!("ID:    {}", u.id);
            })
        }
        AuthCommands::Register {
            email,
            full_name,
            password,
        } => {
            let password = resolve_password(password, "Choose a password")?;
            let session = auth.register(&email, &password, &full_name).await?;
            remember_user(session.email.clone())?;
            output_success(
                &output_format,
                &format!("Registered and logged in as {}", email),
                Some(session_json(&server, &session)),
            )
        }
        AuthCommands::ResetPassword { email } => {
            auth.request_password_reset(&email).await?;
            output_success(
                &output_format,
                &format!("If an account exists for {}, a reset email is on its way", email),
                None,
            )
        }
        AuthCommands::Passwd { current, new_password } => {
            let current = resolve_password(current, "Current password")?;
            let new_password = match new_password {
                Some(p) => p,
                None => prompt_password("New password")?,
            };
            client.users().change_password(&current, &new_password).await?;
            output_success(&output_format, "Password changed", None)
        }
        AuthCommands::Profile { full_name, phone } => {
            let user = client
                .users()
                .update_profile(&ProfileUpdate { full_name, phone })
                .await?;
            output_value(&output_format, &user, |u| {
                println!("✓ Profile updated: {} <{}>", u.display_name(), u.email)
            })
        }
    }
}
