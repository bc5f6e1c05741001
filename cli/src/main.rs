//! keyproof: verify users' keys against their hosted proofs.

mod config;
mod snapshot;
mod terminal;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use keyproof_types::SystemClock;
use keyproof_utils::{init_logging, LogFormat};
use keyproof_verification::{IdentifyArg, IdentifyCache, Identifier, Prompter, SelfVerifier};

use crate::config::{CliConfig, FileConfigStore};
use crate::snapshot::Snapshot;
use crate::terminal::{StdoutSink, TerminalPrompter};

#[derive(Parser)]
#[command(name = "keyproof", about = "Verify users' keys against their hosted proofs")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "KEYPROOF_CONFIG")]
    config: Option<PathBuf>,

    /// Recorded users, proofs and tracking statements.
    #[arg(long, default_value = "./keyproof_snapshot.toml", env = "KEYPROOF_SNAPSHOT")]
    snapshot: PathBuf,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "KEYPROOF_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "KEYPROOF_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Verify a user's key and proofs.
    Identify {
        /// Name or id of the user to verify.
        user: String,

        /// Verify as this user, diffing against their tracking statement.
        #[arg(long = "as")]
        viewer: Option<String>,

        /// Print a JSON summary instead of live narration.
        #[arg(long)]
        json: bool,
    },
    /// Confirm the service's key for yourself and record it locally.
    IdentifySelf {
        /// Your name or id.
        user: String,

        /// Never prompt; fail instead.
        #[arg(long, env = "KEYPROOF_BACKGROUND")]
        background: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) if path.exists() => CliConfig::from_toml_file(path)?,
        _ => CliConfig::default(),
    };

    let log_format = cli.log_format.unwrap_or(file_config.log_format);
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| file_config.log_level.clone());
    init_logging(log_format, &log_level);

    if let Some(path) = &cli.config {
        tracing::debug!("Using config {}", path.display());
    }

    let snapshot = Snapshot::from_toml_file(&cli.snapshot)
        .with_context(|| format!("loading snapshot {}", cli.snapshot.display()))?;
    tracing::info!("Loaded snapshot from {}", cli.snapshot.display());

    let config_path = cli.config;
    let command = cli.command;
    tokio::task::spawn_blocking(move || run(command, file_config, config_path, snapshot)).await?
}

fn run(
    command: Command,
    config: CliConfig,
    config_path: Option<PathBuf>,
    snapshot: Snapshot,
) -> anyhow::Result<()> {
    let snapshot = Arc::new(snapshot);
    let cache = IdentifyCache::new(Arc::new(SystemClock), config.cache_ttl_secs);
    let identifier = Identifier::new(snapshot.clone(), Arc::new(StdoutSink)).with_cache(cache);

    match command {
        Command::Identify { user, viewer, json } => {
            let subject = snapshot
                .user(&user)
                .ok_or_else(|| anyhow!("unknown user {user}"))?;
            let me = viewer
                .map(|v| snapshot.user(&v).ok_or_else(|| anyhow!("unknown user {v}")))
                .transpose()?;

            let mut arg = IdentifyArg::new();
            if let Some(me) = &me {
                arg = arg.with_me(me);
            }
            if !json {
                arg = arg.with_report_hook(identifier.report_hook());
            }

            let res = identifier.identify(&subject, &arg);
            tracing::debug!(stats = ?identifier.cache().stats(), "identify cache");
            if json {
                println!("{}", serde_json::to_string_pretty(&res.summary())?);
            }
            if let Some(err) = res.get_error() {
                bail!(err);
            }
            tracing::info!("{} verified", subject.name());
        }
        Command::IdentifySelf { user, background } => {
            let Some(config_path) = config_path else {
                bail!("identify-self needs --config to record the accepted key");
            };
            let me = snapshot
                .user(&user)
                .ok_or_else(|| anyhow!("unknown user {user}"))?;

            let store = FileConfigStore::new(config_path);
            let prompter = TerminalPrompter;
            let interactive: Option<&dyn Prompter> =
                std::io::stdin().is_terminal().then_some(&prompter as &dyn Prompter);

            let verified = SelfVerifier::new(&identifier, &store, interactive)
                .identify_self(&me, background || config.background);
            tracing::debug!(stats = ?identifier.cache().stats(), "identify cache");
            verified?;
            tracing::info!(
                "Key for {} confirmed in {}",
                me.name(),
                store.path().display()
            );
        }
    }

    Ok(())
}
