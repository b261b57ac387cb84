use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use notion_scriptbot::config::{self, ConfigError, Secrets};
use notion_scriptbot::notion::NotionClient;
use notion_scriptbot::openai::OpenAiClient;
use notion_scriptbot::scheduler::Scheduler;
use notion_scriptbot::scripting::ScriptJob;
use notion_scriptbot::store::RecordStore;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Generate video scripts for Notion records waiting in the Scripting state"
)]
struct Args {
    /// Optional YAML file overriding the built-in settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Print the default configuration as YAML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if args.print_config {
        print!("{}", config::example());
        return Ok(());
    }
    let cfg = config::load(args.config.as_deref())?;
    let secrets = match Secrets::from_env(true) {
        Ok(secrets) => secrets,
        Err(ConfigError::MissingEnv(names)) => {
            eprintln!("Please set these environment variables (or add them to .env):");
            for name in names {
                eprintln!("   - {}", name);
            }
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let base_url = Url::parse(&cfg.notion.base_url).context("invalid notion.base_url")?;
    let notion = NotionClient::with_base_url(
        secrets.notion_token.clone(),
        cfg.notion.version.clone(),
        base_url,
    )?;
    let store = RecordStore::new(
        notion,
        secrets.database_id.clone(),
        cfg.notion.properties.clone(),
    );
    let api_key = secrets
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY is required")?;
    let writer = OpenAiClient::new(api_key, cfg.openai.clone())?;

    let job = ScriptJob::new(store, writer, cfg.scripting.clone());
    let mut scheduler = Scheduler::new(
        job,
        Duration::from_secs(cfg.scripting.poll_interval_secs),
        Duration::from_secs(cfg.app.cooldown_secs),
    );

    info!(
        status = %cfg.scripting.source_status,
        "script generator started; watching for records"
    );
    if args.once {
        scheduler.tick().await.into_result()?;
        return Ok(());
    }

    let running = scheduler.start();
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("stop requested; finishing the current pass");
    running.stop().await?;
    Ok(())
}
