use anyhow::{Context, Result};
use dialoguer::{Input, theme::ColorfulTheme};

use crate::llm::{ClientConfig, CompletionClient, chat, extract_key_points, summarize};
use crate::palette::Palette;
use crate::store::LocalStore;

use super::{ai_client, extracted_text};

const EXIT_WORDS: [&str; 3] = ["exit", "quit", ":q"];

pub async fn run_summary(store: &LocalStore, config: ClientConfig) -> Result<()> {
    let text = extracted_text(store)?;
    let client = ai_client(store, config)?;

    println!("{}", Palette::dim("Generating summary..."));
    let summary = summarize(&client, &text)
        .await
        .context("Error generating summary")?;

    println!("\n{}\n", Palette::bold("📝 Content Summary"));
    println!("{}", summary.trim());
    Ok(())
}

pub async fn run_key_points(store: &LocalStore, config: ClientConfig) -> Result<()> {
    let text = extracted_text(store)?;
    let client = ai_client(store, config)?;

    println!("{}", Palette::dim("Extracting key points..."));
    let key_points = extract_key_points(&client, &text)
        .await
        .context("Error extracting key points")?;

    println!("\n{}\n", Palette::bold("🔑 Key Points"));
    println!("{}", key_points.trim());
    Ok(())
}

/// Answers `message` once, or opens a prompt loop when it is `None`.
pub async fn run_chat(
    store: &LocalStore,
    config: ClientConfig,
    message: Option<String>,
    use_context: bool,
) -> Result<()> {
    let context = if use_context {
        extracted_text(store)?
    } else {
        String::new()
    };
    let client = ai_client(store, config)?;

    match message {
        Some(message) => answer(&client, &message, &context).await,
        None => chat_loop(&client, &context).await,
    }
}

async fn answer(client: &CompletionClient, message: &str, context: &str) -> Result<()> {
    let reply = chat(client, message, context)
        .await
        .context("Error getting a chat reply")?;
    println!("{}", reply.trim());
    Ok(())
}

async fn chat_loop(client: &CompletionClient, context: &str) -> Result<()> {
    println!(
        "{}",
        Palette::paint(
            Palette::INFO,
            "Hi! I can answer questions about the content from the webpage. \
             What would you like to know?"
        )
    );
    println!("{}", Palette::dim("Leave the line empty or type `exit` to leave."));

    loop {
        let line: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;

        if is_exit(&line) {
            break;
        }

        // A failed turn is reported and the session keeps going.
        if let Err(err) = answer(client, line.trim(), context).await {
            eprintln!("{}", Palette::paint(Palette::DANGER, format!("{err:#}")));
        }
    }
    Ok(())
}

fn is_exit(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || EXIT_WORDS.iter().any(|word| trimmed.eq_ignore_ascii_case(word))
}
