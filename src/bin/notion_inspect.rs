use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;
use notion_scriptbot::config::{self, Secrets};
use notion_scriptbot::notion::NotionClient;

#[derive(Parser, Debug)]
#[command(author, version, about = "Print the property schema of a Notion database")]
struct Args {
    /// Optional YAML file overriding the built-in settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database ID to inspect (defaults to NOTION_DATABASE_ID)
    #[arg(long)]
    db_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let cfg = config::load(args.config.as_deref())?;
    let secrets = Secrets::from_env(false)?;
    let base_url = Url::parse(&cfg.notion.base_url).context("invalid notion.base_url")?;
    let client = NotionClient::with_base_url(
        secrets.notion_token.clone(),
        cfg.notion.version.clone(),
        base_url,
    )?;

    let db_id = args.db_id.unwrap_or_else(|| secrets.database_id.clone());
    let db = client.retrieve_database(&db_id).await?;
    println!("Database ID: {}", db.id);
    println!("Properties:");
    let mut props: Vec<_> = db.properties.into_iter().collect();
    props.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, prop) in props {
        println!("  {} -> {{ id: {}, type: {} }}", name, prop.id, prop.typ);
    }
    Ok(())
}
