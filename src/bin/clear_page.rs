use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;
use tracing::info;
use tracing_subscriber::EnvFilter;

use notion_scriptbot::config::{self, Secrets};
use notion_scriptbot::notion::{NotionClient, NotionService};
use notion_scriptbot::store::RecordStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "Delete every content block of a Notion page")]
struct Args {
    /// Page whose content should be removed
    page_id: String,

    /// Optional YAML file overriding the built-in settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Actually delete; without it the blocks are only counted
    #[arg(long)]
    yes: bool,
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
    let secrets = Secrets::from_env(false)?;
    let base_url = Url::parse(&cfg.notion.base_url).context("invalid notion.base_url")?;
    let notion = NotionClient::with_base_url(
        secrets.notion_token.clone(),
        cfg.notion.version.clone(),
        base_url,
    )?;
    let store = RecordStore::new(notion, secrets.database_id.clone(), cfg.notion.properties);

    if !args.yes {
        let children = store.notion().list_children(&args.page_id).await?;
        println!(
            "Page {} has {} blocks; re-run with --yes to delete them",
            args.page_id,
            children.len()
        );
        return Ok(());
    }

    let deleted = store.delete_all_blocks(&args.page_id).await?;
    info!(page_id = %args.page_id, deleted, "page cleared");
    println!("Deleted {} blocks from {}", deleted, args.page_id);
    Ok(())
}
