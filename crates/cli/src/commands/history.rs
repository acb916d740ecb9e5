//! `greenbible history`: inspect, limit, or clear the stored conversation.

use chrono::Local;
use greenbible_core::message::HistoryLimit;

use super::{load_config, Stores};

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let stores = Stores::open(&config);

    let limit = stores.history.load_limit().await;
    let messages = stores.history.load(limit).await;

    if messages.is_empty() {
        println!("  No chat history yet. Run `greenbible chat` to start.");
        return Ok(());
    }

    println!("💬 Chat history ({} messages, limit {})", messages.len(), HistoryLimit::resolve(limit));
    println!();
    for m in &messages {
        let at = m.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        println!("  [{at}] {:<9} {}", m.role.as_str(), m.text);
    }
    Ok(())
}

pub async fn limit(value: Option<i64>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let stores = Stores::open(&config);

    match value {
        None => {
            let stored = stores.history.load_limit().await;
            match stored {
                Some(limit) => println!("  History limit: {limit} (keeps {})", HistoryLimit::resolve(stored)),
                None => println!("  History limit: default (keeps {})", HistoryLimit::DEFAULT),
            }
        }
        Some(value) => {
            let limit = HistoryLimit(value);
            let retained = stores.history.save_limit(limit).await?;
            println!(
                "✅ History limit set to {} ({} messages kept)",
                HistoryLimit::resolve(Some(limit)),
                retained.len()
            );
        }
    }
    Ok(())
}

pub async fn clear() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let stores = Stores::open(&config);
    stores.history.clear().await?;
    println!("✅ Chat history cleared");
    Ok(())
}
