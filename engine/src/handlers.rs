//! Command handlers for CLI operations
//!
//! Each handler loads what it needs, runs one pipeline operation, and prints
//! the result as text or JSON. Artifacts go to stdout, logs to stderr.

use anyhow::{Context, Result};
use sdk::errors::PipelineErrorExt;
use sdk::types::{CoverageReport, Outline, Patch, SourceCard};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::assistant::{ChatAssistant, DeckDocument};
use crate::config::Config;
use crate::llm::{provider_from_config, LLMProvider};
use crate::pipeline::{
    estimate_page_count, validate_coverage, DeckBuilder, Extractor, Generator, OutlineBuilder,
    Pipeline,
};
use crate::secrets::{env_var_for, SecretCache, SecretManager, KNOWN_KEYS, SERVICE_NAME};
use crate::styles::{StyleBook, ThemeCatalog};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Cards files are either a bare array or an `extract --json` result
#[derive(Deserialize)]
#[serde(untagged)]
enum CardsFile {
    List(Vec<SourceCard>),
    Extraction { cards: Vec<SourceCard> },
}

fn build_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let manager = Arc::new(SecretManager::new(SERVICE_NAME));
    let secrets = Arc::new(SecretCache::new(manager));
    let provider = provider_from_config(&config.llm, secrets)
        .with_context(|| format!("Failed to set up provider '{}'", config.llm.provider))?;
    tracing::debug!(provider = provider.name(), "Provider ready");
    Ok(provider)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = read_text(path)?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn with_hint(e: sdk::errors::PipelineError) -> anyhow::Error {
    let hint = e.user_hint().to_string();
    anyhow::Error::new(e).context(hint)
}

/// Run every stage and optionally write the artifacts to a directory
pub async fn handle_run(
    source: PathBuf,
    style: Option<String>,
    theme: Option<String>,
    out: Option<PathBuf>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let text = read_text(&source)?;
    let style = style.unwrap_or_else(|| config.pipeline.style.clone());
    let theme = theme.unwrap_or_else(|| config.pipeline.theme.clone());

    let pipeline = Pipeline::new(
        Generator::new(build_provider(config)?),
        StyleBook::with_custom(&config.styles),
        &config.pipeline,
    );
    let run = pipeline.run(&text, &style, &theme).await.map_err(with_hint)?;

    if let Some(dir) = &out {
        write_artifacts(dir, &run)?;
    }

    match format {
        OutputFormat::Text => {
            println!(
                "Extracted {} card(s), dropped {}; outline has {} slide(s).",
                run.extraction.cards.len(),
                run.extraction.dropped.len(),
                run.outline.slides.len()
            );
            print_report(&run.report);
            match &out {
                Some(dir) => println!("Artifacts written to {}", dir.display()),
                None => println!("\n{}", run.deck_markdown),
            }
        }
        OutputFormat::Json => print_json(&run)?,
    }

    Ok(())
}

fn write_artifacts(dir: &Path, run: &crate::pipeline::PipelineRun) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let files: [(&str, String); 4] = [
        ("cards.json", serde_json::to_string_pretty(&run.extraction)?),
        ("outline.json", serde_json::to_string_pretty(&run.outline)?),
        ("slides.md", run.deck_markdown.clone()),
        ("coverage.json", serde_json::to_string_pretty(&run.report)?),
    ];
    for (name, contents) in files {
        let path = dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

pub async fn handle_extract(source: PathBuf, config: &Config, format: OutputFormat) -> Result<()> {
    let text = read_text(&source)?;
    let extractor = Extractor::new(
        Generator::new(build_provider(config)?),
        config.pipeline.extract_timeout(),
    );
    let extraction = extractor.extract(&text).await.map_err(with_hint)?;

    match format {
        OutputFormat::Text => {
            for card in &extraction.cards {
                println!("[{}] ({:?}) {}", card.card_id, card.importance, card.quote);
            }
            if !extraction.dropped.is_empty() {
                println!("Dropped (quote not in source): {}", extraction.dropped.join(", "));
            }
        }
        OutputFormat::Json => print_json(&extraction)?,
    }
    Ok(())
}

pub fn handle_estimate(count: usize, format: OutputFormat) -> Result<()> {
    let pages = estimate_page_count(count);
    match format {
        OutputFormat::Text => println!("{} card(s) -> {} slide(s)", count, pages),
        OutputFormat::Json => print_json(&json!({ "cards": count, "estimated_pages": pages }))?,
    }
    Ok(())
}

pub async fn handle_outline(
    cards: PathBuf,
    style: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let cards = match read_json::<CardsFile>(&cards)? {
        CardsFile::List(cards) | CardsFile::Extraction { cards } => cards,
    };
    let styles = StyleBook::with_custom(&config.styles);
    let style = styles.resolve(style.as_deref().unwrap_or(&config.pipeline.style));

    let builder = OutlineBuilder::new(
        Generator::new(build_provider(config)?),
        config.pipeline.outline_timeout(),
    );
    let outline = builder
        .build(&cards, estimate_page_count(cards.len()), style)
        .await
        .map_err(with_hint)?;

    match format {
        OutputFormat::Text => {
            println!("{} ({} slides)", outline.meta.topic, outline.slides.len());
            for slide in &outline.slides {
                println!("  {} {}", slide.slide_id, slide.title);
            }
        }
        OutputFormat::Json => print_json(&outline)?,
    }
    Ok(())
}

pub async fn handle_deck(
    outline: PathBuf,
    style: Option<String>,
    theme: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let outline: Outline = read_json(&outline)?;
    let styles = StyleBook::with_custom(&config.styles);
    let style = styles.resolve(style.as_deref().unwrap_or(&config.pipeline.style));
    let theme = theme.unwrap_or_else(|| config.pipeline.theme.clone());

    let builder = DeckBuilder::new(
        Generator::new(build_provider(config)?),
        config.pipeline.deck_timeout(),
    );
    let markdown = builder
        .build(&outline, &theme, style)
        .await
        .map_err(with_hint)?;

    match format {
        OutputFormat::Text => println!("{}", markdown),
        OutputFormat::Json => print_json(&json!({ "markdown": markdown }))?,
    }
    Ok(())
}

pub fn handle_validate(outline: PathBuf, deck: PathBuf, format: OutputFormat) -> Result<()> {
    let outline: Outline = read_json(&outline)?;
    let markdown = read_text(&deck)?;
    let report = validate_coverage(&outline, &markdown);

    match format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

fn print_report(report: &CoverageReport) {
    for note in &report.notes {
        println!("{}", note);
    }
    for id in &report.duplicate_slide_ids {
        println!("  duplicate slide id: {}", id);
    }
    for patch in &report.proposed_patches {
        match patch {
            Patch::InsertSlide { patch_id, slide_id, insert_at_index, .. } => {
                println!("  {} insert '{}' at {}", patch_id, slide_id, insert_at_index)
            }
            Patch::AppendBullets { patch_id, slide_id, append, .. } => {
                println!("  {} append {} point(s) to '{}'", patch_id, append.len(), slide_id)
            }
        }
    }
}

/// Line-oriented chat session over stdin
///
/// Each non-empty line is one user turn. `/quit` or end of input ends the
/// session. A failed turn is reported and the session goes on.
pub async fn handle_chat(
    deck: PathBuf,
    save: bool,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let document = DeckDocument::parse(&read_text(&deck)?);
    let mut assistant = ChatAssistant::new(
        build_provider(config)?,
        document,
        config.pipeline.chat_max_rounds,
    );

    if let OutputFormat::Text = format {
        eprintln!(
            "Chatting about {} ({} pages). Type /quit to finish.",
            deck.display(),
            assistant.document().pages().len()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        match format {
            OutputFormat::Text => {
                let (tx, mut rx) = mpsc::channel::<String>(64);
                let printer = tokio::spawn(async move {
                    use std::io::Write;
                    while let Some(piece) = rx.recv().await {
                        print!("{}", piece);
                        std::io::stdout().flush().ok();
                    }
                });

                let outcome = assistant.send(line, Some(tx)).await;
                printer.await.ok();
                match outcome {
                    Ok(reply) => {
                        println!();
                        for call in &reply.tool_calls {
                            eprintln!("  [{}] {}", call.name, call.result);
                        }
                    }
                    Err(e) => eprintln!("Error: {} ({})", e, e.user_hint()),
                }
            }
            OutputFormat::Json => match assistant.send(line, None).await {
                Ok(reply) => print_json(&reply)?,
                Err(e) => print_json(&json!({ "error": e.to_string(), "hint": e.user_hint() }))?,
            },
        }
    }

    if save {
        std::fs::write(&deck, assistant.document().render())
            .with_context(|| format!("Failed to save {}", deck.display()))?;
        tracing::info!(path = %deck.display(), "Deck saved");
        if let OutputFormat::Text = format {
            eprintln!("Saved {}", deck.display());
        }
    }

    Ok(())
}

pub fn handle_styles(config: &Config, format: OutputFormat) -> Result<()> {
    let styles = StyleBook::with_custom(&config.styles);
    match format {
        OutputFormat::Text => {
            for style in styles.list() {
                let origin = if style.is_builtin { "builtin" } else { "custom" };
                println!("{:<12} {:<8} {}", style.id, origin, style.description);
            }
        }
        OutputFormat::Json => print_json(&styles.list())?,
    }
    Ok(())
}

pub fn handle_themes(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for theme in ThemeCatalog::all() {
                println!("{:<12} {}", theme.theme, theme.layouts.join(", "));
            }
        }
        OutputFormat::Json => print_json(&ThemeCatalog::all())?,
    }
    Ok(())
}

/// Validate configuration, key availability, and provider reachability
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let config_path = Config::default_config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let manager = SecretManager::new(SERVICE_NAME);
    let keys: Vec<(&str, bool)> = KNOWN_KEYS
        .iter()
        .map(|key| {
            let present = std::env::var(env_var_for(key)).is_ok() || manager.has_secret(key);
            (*key, present)
        })
        .collect();

    let (provider_name, provider_ok, provider_error) = match build_provider(config) {
        Ok(provider) => {
            let healthy = provider.check_health().await;
            (provider.name().to_string(), healthy, None)
        }
        Err(e) => (config.llm.provider.clone(), false, Some(format!("{:#}", e))),
    };

    let styles = StyleBook::with_custom(&config.styles);

    match format {
        OutputFormat::Text => {
            println!("Config:    {}", config_path);
            println!(
                "Provider:  {} ({})",
                provider_name,
                if provider_ok { "reachable" } else { "unavailable" }
            );
            if let Some(error) = &provider_error {
                println!("           {}", error);
            }
            println!("Styles:    {}", styles.list().len());
            println!("Keys:");
            for (key, present) in &keys {
                println!("  {:<28} {}", key, if *present { "set" } else { "missing" });
            }
        }
        OutputFormat::Json => print_json(&json!({
            "config_path": config_path,
            "provider": {
                "name": provider_name,
                "healthy": provider_ok,
                "error": provider_error,
            },
            "styles": styles.list().len(),
            "keys": keys.iter().map(|(k, v)| json!({ "key": k, "present": v })).collect::<Vec<_>>(),
        }))?,
    }

    Ok(())
}

pub fn handle_secret_set(key: &str) -> Result<()> {
    let manager = SecretManager::new(SERVICE_NAME);
    if !KNOWN_KEYS.contains(&key) {
        tracing::warn!("'{}' is not a key any provider reads", key);
    }
    let value = manager.prompt_for_secret(key)?;
    manager.set_secret(key, &value)?;
    println!("Stored {}", key);
    Ok(())
}

pub fn handle_secret_delete(key: &str) -> Result<()> {
    SecretManager::new(SERVICE_NAME).delete_secret(key)?;
    println!("Deleted {}", key);
    Ok(())
}
