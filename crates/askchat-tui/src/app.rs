use askchat_core::{AnswerOutcome, AskError, Conversation};
use ratatui::layout::Rect;
use tokio::task::{JoinError, JoinHandle};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub conversation: Conversation,
    pub endpoint: String,

    // In-flight answer request, at most one
    pub answer_task: Option<JoinHandle<AnswerOutcome>>,

    // Input state
    pub input_cursor: usize, // cursor position in chars

    // Chat view state
    pub chat_scroll: u16,
    pub chat_max_scroll: u16, // updated during render
    pub follow_tail: bool,

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(conversation: Conversation, endpoint: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            conversation,
            endpoint: endpoint.into(),
            answer_task: None,
            input_cursor: 0,
            chat_scroll: 0,
            chat_max_scroll: 0,
            follow_tail: true,
            chat_area: None,
            animation_frame: 0,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.conversation.is_busy()
    }

    /// Key-submit: hand the pending input to the conversation and, if it was
    /// accepted, run the request in the background.
    pub fn submit_pending(&mut self) {
        let Some(request) = self.conversation.submit_pending() else {
            return;
        };

        self.input_cursor = 0;
        self.animation_frame = 0;
        // Jump to the bottom so the typing indicator is visible
        self.follow_tail = true;
        self.answer_task = Some(tokio::spawn(request.send()));
    }

    /// Called by the event loop when the background request settles.
    pub fn finish_answer(&mut self, joined: Result<AnswerOutcome, JoinError>) {
        self.answer_task = None;
        let outcome = joined.unwrap_or_else(|err| Err(AskError::TaskFailed(err.to_string())));
        self.conversation.complete(outcome);
        self.follow_tail = true;
    }

    /// Abort anything still in flight; only used on the way out.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.answer_task.take() {
            tracing::info!("quitting with an answer request in flight");
            task.abort();
        }
    }

    // Input editing. All edits go through `Conversation::update_input`.

    fn edit_input(&mut self, edit: impl FnOnce(&mut String, &mut usize)) {
        let mut text = self.conversation.pending_input().to_string();
        let mut cursor = self.input_cursor.min(text.chars().count());
        edit(&mut text, &mut cursor);
        self.input_cursor = cursor;
        self.conversation.update_input(text);
    }

    pub fn insert_char(&mut self, c: char) {
        self.edit_input(|text, cursor| {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        });
    }

    pub fn insert_str(&mut self, s: &str) {
        // The input is a single line
        let s: String = s.chars().filter(|c| *c != '\r' && *c != '\n').collect();
        self.edit_input(|text, cursor| {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert_str(byte_pos, &s);
            *cursor += s.chars().count();
        });
    }

    pub fn delete_before_cursor(&mut self) {
        self.edit_input(|text, cursor| {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        });
    }

    pub fn delete_at_cursor(&mut self) {
        self.edit_input(|text, cursor| {
            if *cursor < text.chars().count() {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        });
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.conversation.pending_input().chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.conversation.pending_input().chars().count();
    }

    // Chat scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
        if self.chat_scroll >= self.chat_max_scroll {
            self.follow_tail = true;
        }
    }

    pub fn half_page(&self) -> u16 {
        self.chat_area
            .map(|r| r.height.saturating_sub(2) / 2)
            .unwrap_or(5)
            .max(1)
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
