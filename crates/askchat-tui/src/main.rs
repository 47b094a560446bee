use anyhow::Result;
use askchat_core::{AnswerClient, AnswerOutcome, Config, Conversation};
use clap::Parser;
use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

mod app;
mod cli;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use cli::Cli;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging is best effort; the chat works without it
    let log_path = logging::init(cli.log_file.clone(), cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let endpoint = cli.endpoint.clone().unwrap_or_else(|| config.resolve_endpoint());
    // The alternate screen hides stderr, so this is printed once the terminal is back
    let logging_notice = match &log_path {
        Ok(path) => {
            info!(endpoint = %endpoint, log = %path.display(), "starting askchat");
            None
        }
        Err(err) => Some(logging::disabled_notice(err)),
    };

    let conversation = Conversation::new(AnswerClient::new(&endpoint))
        .with_fallback_message(config.fallback_message());
    let mut app = App::new(conversation, endpoint);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app).await;

    app.shutdown();
    tui::restore()?;
    info!(turns = app.conversation.messages().len(), "askchat exited");
    if let Some(notice) = logging_notice {
        eprintln!("{notice}");
    }

    result
}

/// Resolves when the in-flight answer task does; never resolves if none.
async fn next_answer(task: &mut Option<JoinHandle<AnswerOutcome>>) -> Result<AnswerOutcome, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event),
                None => {
                    warn!("terminal event channel closed");
                    break;
                }
            },
            joined = next_answer(&mut app.answer_task), if app.answer_task.is_some() => {
                app.finish_answer(joined);
            }
        }
    }

    Ok(())
}
