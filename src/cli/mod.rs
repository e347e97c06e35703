pub mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::gateway::{parse_id, CancellationHandle, FetchOptions, MissionGateway};
use crate::identity::{AccessToken, RequestContext, StaticIdentity};

/// Environment fallback for `--token`
pub const TOKEN_ENV: &str = "SPO_ACCESS_TOKEN";

#[derive(Parser)]
#[command(name = "missions")]
#[command(about = "Missions CLI - Read the missions list with a pre-acquired access token")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Bearer token for the missions resource (or SPO_ACCESS_TOKEN)")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "Upstream timeout in seconds")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List all missions, oldest launch first")]
    List,

    #[command(about = "Show one mission by id")]
    Show {
        #[arg(help = "Numeric mission id")]
        id: String,
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

    let mut upstream = UpstreamConfig::from_env()?;
    if let Some(secs) = cli.timeout {
        anyhow::ensure!(secs > 0, "--timeout must be at least one second");
        upstream.timeout_secs = secs;
    }

    let token = cli
        .token
        .or_else(|| std::env::var(TOKEN_ENV).ok())
        .filter(|t| !t.trim().is_empty())
        .context("an access token is required (--token or SPO_ACCESS_TOKEN)")?;

    let identity = Arc::new(StaticIdentity::new(AccessToken::new(token)));
    let gateway = MissionGateway::new(&upstream, identity)?;

    let ctx = RequestContext::new("/missions", None);
    let token = gateway
        .resolve_configured_token(&ctx)
        .await
        .map_err(|redirect| anyhow::anyhow!("sign-in required: {}", redirect.location()))?;

    // Ctrl-C abandons the in-flight request instead of waiting out the timeout
    let cancellation = CancellationHandle::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });
    let options = FetchOptions {
        timeout: Some(Duration::from_secs(upstream.timeout_secs)),
        cancellation: Some(cancellation),
    };

    match cli.command {
        Commands::List => {
            let missions = gateway.list_missions_with(&token, &options).await?;
            if missions.is_empty() {
                return utils::output_empty_collection(&output_format, "missions", "No missions found");
            }
            utils::output_missions(&output_format, &missions)
        }
        Commands::Show { id } => {
            let mission_id = parse_id(&id).with_context(|| format!("'{}' is not a mission id", id))?;
            let mission = gateway.get_mission_with(&token, mission_id, &options).await?;
            utils::output_mission(&output_format, &mission)
        }
    }
}
