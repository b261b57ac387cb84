use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use notion_scriptbot::backfill::ThumbnailJob;
use notion_scriptbot::config::{self, ConfigError, Secrets};
use notion_scriptbot::notion::NotionClient;
use notion_scriptbot::scheduler::Scheduler;
use notion_scriptbot::store::RecordStore;
use notion_scriptbot::thumbnail::{HttpProbe, ThumbnailFinder};
use notion_scriptbot::youtube::extract_video_id;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Backfill YouTube thumbnail URLs for Notion records that have a video URL"
)]
struct Args {
    /// Optional YAML file overriding the built-in settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// List every thumbnail tier for one video URL and exit
    #[arg(long, value_name = "VIDEO_URL")]
    probe: Option<String>,
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
    let cfg = config::load(args.config.as_deref())?;
    let probe = HttpProbe::new(Duration::from_secs(cfg.thumbnails.probe_timeout_secs))?;
    let finder = ThumbnailFinder::new(probe, cfg.thumbnails.image_host.clone());

    if let Some(url) = args.probe.as_deref() {
        let video_id =
            extract_video_id(url).with_context(|| format!("not a YouTube video URL: {}", url))?;
        println!("Video ID: {}", video_id);
        for candidate in finder.probe_all(&video_id).await {
            let mark = if candidate.exists { "yes" } else { "no" };
            println!("  {:<8} {:<4} {}", candidate.quality, mark, candidate.url);
        }
        return Ok(());
    }

    let secrets = match Secrets::from_env(false) {
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
    let store = RecordStore::new(notion, secrets.database_id.clone(), cfg.notion.properties.clone());
    let job = ThumbnailJob::new(
        store,
        finder,
        Duration::from_millis(cfg.thumbnails.record_delay_ms),
    );
    let mut scheduler = Scheduler::new(
        job,
        Duration::from_secs(cfg.thumbnails.poll_interval_secs),
        Duration::from_secs(cfg.app.cooldown_secs),
    );

    info!("thumbnail fetcher started; watching for records with a video URL");
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
