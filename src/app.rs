use askme_core::{ChatEngine, ChatMessage, ChatRole, SubmitOutcome};
use tokio::task::JoinHandle;

use crate::ui::markup_lines;

pub struct App {
    pub should_quit: bool,
    pub engine: ChatEngine,

    // Prompt box
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript viewport
    pub scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    pub exchange_task: Option<JoinHandle<SubmitOutcome>>,
    pub animation_frame: u8,
}

impl App {
    pub fn new(engine: ChatEngine) -> Self {
        Self {
            should_quit: false,
            engine,
            input: String::new(),
            cursor: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            exchange_task: None,
            animation_frame: 0,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.exchange_task.is_some() || self.engine.is_pending()
    }

    /// Hand the current prompt to the engine on a background task.
    ///
    /// Returns false when there is nothing to send or an exchange is running.
    pub fn submit(&mut self) -> bool {
        if self.input.trim().is_empty() || self.is_waiting() {
            return false;
        }

        let engine = self.engine.clone();
        let prompt = self.input.clone();
        self.exchange_task = Some(tokio::spawn(async move { engine.submit(&prompt).await }));
        true
    }

    /// Collect a finished exchange, if any. Called on every loop iteration.
    pub async fn poll_exchange(&mut self) {
        let finished = self
            .exchange_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.exchange_task.take() {
            match task.await {
                Ok(SubmitOutcome::Busy) => {
                    tracing::warn!("prompt rejected, exchange already pending");
                    return;
                }
                Ok(_) => {}
                Err(err) => tracing::error!(error = %err, "exchange task aborted"),
            }

            // The prompt box empties once the exchange is over, success or not
            self.input.clear();
            self.cursor = 0;
            self.scroll_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        } else {
            self.animation_frame = 0;
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// Scroll the transcript so the newest entry is visible
    pub fn scroll_to_bottom(&mut self) {
        let history = self.engine.history();
        let total_lines = transcript_height(&history, self.wrap_width(), self.is_waiting());

        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };

        self.scroll = total_lines.saturating_sub(visible_height);
    }

    fn wrap_width(&self) -> usize {
        // Use actual chat width for wrap calculation, default to 50 if not set
        if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        }
    }
}

/// Rough rendered height of the transcript, counting wrapped lines.
fn transcript_height(history: &[ChatMessage], wrap_width: usize, waiting: bool) -> u16 {
    let mut total_lines: usize = 0;

    for msg in history {
        total_lines += 1; // Role line ("You:" or "AI:")
        let widths: Vec<usize> = match msg.role {
            ChatRole::User => msg.content.lines().map(|l| l.chars().count()).collect(),
            ChatRole::Assistant => markup_lines(&msg.content)
                .iter()
                .map(|line| line.width())
                .collect(),
        };
        for width in widths {
            total_lines += width / wrap_width.max(1) + 1;
        }
        total_lines += 1; // Blank line after message
    }

    if waiting {
        total_lines += 2; // "AI:" + "Thinking..."
    }

    u16::try_from(total_lines).unwrap_or(u16::MAX)
}
