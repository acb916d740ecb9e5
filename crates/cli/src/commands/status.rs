//! `greenbible status`: show system status.

use greenbible_config::AppConfig;
use greenbible_core::message::HistoryLimit;
use greenbible_core::store::TaskStore;
use greenbible_providers::ConfiguredLocation;

use super::{load_config, Stores};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let stores = Stores::open(&config);

    let limit = stores.history.load_limit().await;
    let history = stores.history.load(limit).await;
    let tasks = stores.tasks.list().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not read tasks");
        Vec::new()
    });

    println!("🌱 GreenBible Status");
    println!("====================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Data dir:     {}", config.data_dir().display());
    println!("  Model:        {}", config.gemini.model);
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Location:     {}", ConfiguredLocation::new(&config.location).describe());
    println!("  Locale:       {}", config.location.locale);
    println!("  History:      {} messages (limit {})", history.len(), HistoryLimit::resolve(limit));
    println!("  Tasks:        {}", tasks.len());

    // Check config file existence
    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, run `greenbible onboard` first");
    }

    Ok(())
}
