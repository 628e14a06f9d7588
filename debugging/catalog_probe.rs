//! Query the movie catalog and print the mapped cards.
//! Usage:
//!   cargo run --bin catalog_probe -- feed <trending|top_rated|upcoming>
//!   cargo run --bin catalog_probe -- search <query> [page]
//!   cargo run --bin catalog_probe -- genres
//! Requires TMDB_BASE_URL and TMDB_API_KEY in the environment (.env supported).

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use moviemania::config::AppConfig;
use moviemania::genres::GenreCatalog;
use moviemania::models::{MovieCard, MoviePage};
use moviemania::tmdb::{CatalogApi, Feed, TmdbClient};
use serde_json::json;
use std::env;

fn print_page(label: &str, page: &MoviePage) -> Result<()> {
    let cards: Vec<MovieCard> = page
        .results
        .iter()
        .map(|m| MovieCard::from_record(m, false))
        .collect();
    let out = json!({
        "label": label,
        "page": page.page,
        "total_pages": page.total_pages,
        "has_more": page.has_more(),
        "movies": cards,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let config = AppConfig::from_env()?;
    if !config.tmdb.is_complete() {
        bail!("TMDB_BASE_URL and TMDB_API_KEY must be set");
    }
    let client = TmdbClient::new(&config.tmdb)?;

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("feed") => {
            let feed: Feed = args
                .get(1)
                .context("feed name required")?
                .parse()?;
            let page = client.feed(feed).await?;
            print_page(feed.title(), &page)
        }
        Some("search") => {
            let query = args.get(1).context("search query required")?;
            let page_no = match args.get(2) {
                Some(p) => p.parse::<u32>().context("page must be a number")?,
                None => 1,
            };
            let page = client.search(query, page_no).await?;
            print_page(&format!("search '{query}'"), &page)
        }
        Some("genres") => {
            let genres = GenreCatalog::load(&client).await;
            let out = json!({
                "source": genres.source(),
                "genres": genres.options(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        _ => bail!("usage: catalog_probe feed <name> | search <query> [page] | genres"),
    }
}
