use std::fs::{self, File};
use std::sync::Mutex;

use anyhow::Result;
use askme_core::{ChatEngine, OpenAIClient};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod handler;
mod tui;
mod ui;

use app::App;
use config::Config;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not read config file, using defaults");
        Config::new()
    });
    let engine_config = config.engine_config();
    if engine_config.api_key.is_empty() {
        tracing::warn!("no API key configured; requests will be rejected by the server");
    }
    if !OpenAIClient::list_models().contains(&engine_config.model) {
        tracing::info!(model = %engine_config.model, "model is not in the known list, sending it anyway");
    }

    let engine = ChatEngine::new(OpenAIClient::new(engine_config)?);
    let mut app = App::new(engine);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}

/// Log to `<cache_dir>/askme/askme.log`, only when `RUST_LOG` is set.
/// The terminal UI owns stderr, so nothing can be written there.
fn init_logging() -> Result<()> {
    let Ok(filter) = EnvFilter::try_from_default_env() else {
        return Ok(());
    };
    let Some(cache_dir) = dirs::cache_dir() else {
        return Ok(());
    };

    let log_dir = cache_dir.join("askme");
    fs::create_dir_all(&log_dir)?;
    let file = File::create(log_dir.join("askme.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
