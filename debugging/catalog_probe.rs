//! Hit each catalog endpoint once and report what came back.
//! Usage:
//!   cargo run --bin catalog_probe
//!   cargo run --bin catalog_probe -- search <query>
//!   cargo run --bin catalog_probe -- detail <item_id>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use streamverse::catalog::{CatalogClient, ListKind};
use streamverse::config::DEFAULT_CATALOG_URL;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let api_key = env::var("TMDB_API_KEY").context("Missing TMDB_API_KEY in environment")?;
    let base = env::var("STREAMVERSE_CATALOG_URL").unwrap_or_else(|_| DEFAULT_CATALOG_URL.to_string());
    let client = CatalogClient::new(base, api_key)?;

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("search") => {
            let query = args[1..].join(" ");
            probe(&client, ListKind::Search(query)).await;
        }
        Some("detail") => {
            let id: i64 = args
                .get(1)
                .context("detail needs an item id")?
                .parse()
                .context("item id must be numeric")?;
            match client.fetch_detail(id).await {
                Ok(Some(item)) => println!("{}", serde_json::to_string_pretty(&item)?),
                Ok(None) => println!("item {id}: not found"),
                Err(e) => println!("item {id}: FAILED ({e})"),
            }
        }
        Some(other) => anyhow::bail!("unknown command '{}'", other),
        None => {
            for kind in [
                ListKind::Trending,
                ListKind::Popular,
                ListKind::TopRated,
                ListKind::Upcoming,
                ListKind::TvPopular,
            ] {
                probe(&client, kind).await;
            }
            match client.fetch_genres().await {
                Ok(genres) => println!("genres: {}", genres.len()),
                Err(e) => println!("genres: FAILED ({e})"),
            }
        }
    }
    Ok(())
}

async fn probe(client: &CatalogClient, kind: ListKind) {
    match client.fetch_list(&kind).await {
        Ok(items) => {
            println!("{kind}: {} items", items.len());
            for item in items.iter().take(3) {
                println!("  {} {} ({})", item.id, item.title, item.year().unwrap_or("-"));
            }
        }
        Err(e) => println!("{kind}: FAILED ({e})"),
    }
}
