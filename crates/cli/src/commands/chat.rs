//! `greenbible chat`: interactive or single-message chat mode.

use std::io::Write;
use std::sync::Arc;

use chrono::Local;
use greenbible_agent::{quick_question, ChatSession, TurnOutcome, TurnReport, QUICK_QUESTIONS};
use greenbible_config::AppConfig;
use greenbible_core::event::{TaskEvent, TaskSubscription};
use greenbible_core::message::{HistoryLimit, Role};
use greenbible_providers::{ConfiguredLocation, GeminiGateway};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{load_config, Stores};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    // Fail early with setup instructions when no key is configured
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export GREENBIBLE_API_KEY='...'");
        eprintln!("    export GEMINI_API_KEY='...'");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let gateway = GeminiGateway::from_config(&config)?;
    let stores = Stores::open(&config);
    let mut task_events = stores.tasks.subscribe();

    let session = ChatSession::new(
        Arc::new(gateway),
        stores.history.clone(),
        stores.tasks.clone(),
        Arc::new(ConfiguredLocation::new(&config.location)),
    )
    .with_locale(config.location.locale.clone())
    .with_context_messages(config.chat.context_messages);

    let restored = session.restore().await;

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let outcome = session.submit(&msg).await;
        eprint!("\r              \r");
        match outcome {
            TurnOutcome::Completed(report) => {
                println!("{}", report.answer.text);
                if let Some(confirmation) = &report.confirmation {
                    println!("{}", confirmation.text);
                }
            }
            TurnOutcome::EmptyInput => return Err("Message is empty".into()),
            TurnOutcome::Busy => return Err("A message is already being answered".into()),
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       GreenBible Plant Assistant             ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Today:     {}", Local::now().format("%A, %B %-d  %-I:%M %p"));
    println!("  Model:     {}", config.gemini.model);
    println!("  History:   {} messages restored (limit {})", restored, session.limit().await);
    println!();
    println!("  Type your question and press Enter. Commands:");
    println!("    /quick N    ask suggested question N");
    println!("    /history    show the conversation");
    println!("    /limit N    change how many messages are kept");
    println!("    /clear      forget the conversation");
    println!("    exit        quit");
    println!();

    if let Some(greeting) = session.greeting().await {
        print_assistant(greeting);
        println!("  Suggested questions:");
        for (i, q) in QUICK_QUESTIONS.iter().enumerate() {
            println!("    {}. {q}", i + 1);
        }
        println!();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt_user()?;
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        if let Some(rest) = input.strip_prefix('/') {
            run_slash_command(&session, rest, &mut task_events).await;
        } else if !input.is_empty() {
            ask(&session, input, &mut task_events).await;
        }

        prompt_user()?;
    }

    println!();
    println!("  Happy gardening! 🌱");
    println!();

    Ok(())
}

async fn run_slash_command(session: &ChatSession, command: &str, events: &mut TaskSubscription) {
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quick"), Some(n)) => match n.parse().ok().and_then(quick_question) {
            Some(question) => {
                println!("  You > {question}");
                ask(session, question, events).await;
            }
            None => eprintln!("  [Error] Pick a question between 1 and {}", QUICK_QUESTIONS.len()),
        },
        (Some("history"), None) => {
            for m in session.messages().await {
                let who = match m.role {
                    Role::User => "You",
                    Role::Assistant => "Assistant",
                };
                let at = m.timestamp.with_timezone(&Local).format("%b %-d %-I:%M %p");
                println!("  [{at}] {who} > {}", m.text);
            }
            println!();
        }
        (Some("limit"), Some(n)) => match n.parse::<i64>() {
            Ok(value) => match session.set_limit(HistoryLimit(value)).await {
                Ok(kept) => println!(
                    "  History limit set to {}; {kept} messages kept.\n",
                    HistoryLimit::resolve(Some(HistoryLimit(value)))
                ),
                Err(e) => eprintln!("  [Error] Could not save the limit: {e}"),
            },
            Err(_) => eprintln!("  [Error] The limit must be a whole number"),
        },
        (Some("clear"), None) => match session.clear().await {
            Ok(()) => println!("  Conversation cleared.\n"),
            Err(e) => eprintln!("  [Error] Could not clear history: {e}"),
        },
        _ => eprintln!("  [Error] Unknown command: /{command}"),
    }
}

async fn ask(session: &ChatSession, question: &str, events: &mut TaskSubscription) {
    eprint!("  ...");
    let outcome = session.submit(question).await;
    eprint!("\r     \r");

    match outcome {
        TurnOutcome::Completed(report) => print_report(&report),
        TurnOutcome::Busy => eprintln!("  [Busy] Still answering the previous question"),
        TurnOutcome::EmptyInput => {}
    }

    while let Some(event) = events.try_recv() {
        if let TaskEvent::Added(task) = event.as_ref() {
            let now = Local::now().naive_local();
            for reminder in task.reminders(now) {
                println!(
                    "  ⏰ Reminder at {}: {}",
                    reminder.trigger_at.format("%-I:%M %p"),
                    reminder.message
                );
            }
            println!();
        }
    }
}

fn print_report(report: &TurnReport) {
    if let Some(notice) = report.notice {
        println!("  ℹ️  {notice}");
    }
    println!();
    print_assistant(&report.answer.text);
    if let Some(confirmation) = &report.confirmation {
        print_assistant(&confirmation.text);
    }
    if !report.persisted {
        eprintln!("  [Warning] The conversation could not be saved");
    }
}

fn print_assistant(text: &str) {
    for line in text.lines() {
        println!("  Assistant > {line}");
    }
    println!();
}

fn prompt_user() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}
