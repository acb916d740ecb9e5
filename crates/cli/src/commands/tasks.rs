//! `greenbible tasks`: calendar task management.

use chrono::{Local, NaiveDate};
use greenbible_core::store::TaskStore;
use greenbible_core::task::parse_clock_time;

use super::{load_config, Stores};

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let stores = Stores::open(&config);
    let tasks = stores.tasks.list().await?;

    if tasks.is_empty() {
        println!("  No tasks scheduled.");
        return Ok(());
    }

    println!("📅 Tasks ({})", tasks.len());
    println!();
    for task in &tasks {
        let time = task
            .time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".into());
        println!("  {}  {time}  {:<40} {}", task.date, task.text, task.id);
    }
    Ok(())
}

pub async fn add(text: &str, date: &str, time: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{date}' (expected YYYY-MM-DD): {e}"))?;
    let time = match time {
        Some(raw) => Some(parse_clock_time(raw).ok_or_else(|| format!("Invalid time '{raw}' (expected HH:MM)"))?),
        None => None,
    };

    let config = load_config()?;
    let stores = Stores::open(&config);
    let task = stores.tasks.add(text, date, time).await?;

    println!("✅ Added \"{}\" on {} ({})", task.text, task.date, task.id);
    Ok(())
}

pub async fn remove(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let stores = Stores::open(&config);

    if stores.tasks.remove(id).await? {
        println!("✅ Removed task {id}");
        Ok(())
    } else {
        Err(format!("No task with id '{id}'").into())
    }
}

pub async fn reminders() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let stores = Stores::open(&config);
    let now = Local::now().naive_local();

    let mut upcoming: Vec<_> = stores
        .tasks
        .list()
        .await?
        .iter()
        .flat_map(|task| task.reminders(now))
        .collect();
    upcoming.sort_by_key(|r| r.trigger_at);

    if upcoming.is_empty() {
        println!("  No upcoming reminders.");
        return Ok(());
    }

    println!("⏰ Upcoming reminders ({})", upcoming.len());
    println!();
    for r in &upcoming {
        println!("  {}  {}: {}", r.trigger_at.format("%Y-%m-%d %H:%M"), r.title, r.message);
    }
    Ok(())
}
