// Slidewright
// Main entry point for the slidewright binary

use clap::Parser;
use slidewright_engine::cli::{Cli, Command, SecretAction};
use slidewright_engine::config::Config;
use slidewright_engine::handlers::{
    handle_chat, handle_deck, handle_doctor, handle_estimate, handle_extract, handle_outline,
    handle_run, handle_secret_delete, handle_secret_set, handle_styles, handle_themes,
    handle_validate, OutputFormat,
};
use slidewright_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log beats the config file; RUST_LOG beats both
    let level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(level);

    tracing::info!(
        "Slidewright v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Run {
            source,
            style,
            theme,
            out,
        } => handle_run(source, style, theme, out, &config, format).await,
        Command::Extract { source } => handle_extract(source, &config, format).await,
        Command::Estimate { count } => handle_estimate(count, format),
        Command::Outline { cards, style } => handle_outline(cards, style, &config, format).await,
        Command::Deck {
            outline,
            style,
            theme,
        } => handle_deck(outline, style, theme, &config, format).await,
        Command::Validate { outline, deck } => handle_validate(outline, deck, format),
        Command::Chat { deck, save } => handle_chat(deck, save, &config, format).await,
        Command::Styles => handle_styles(&config, format),
        Command::Themes => handle_themes(format),
        Command::Doctor => handle_doctor(&config, format).await,
        Command::Secret { action } => match action {
            SecretAction::Set { key } => handle_secret_set(&key),
            SecretAction::Delete { key } => handle_secret_delete(&key),
        },
    }
}
