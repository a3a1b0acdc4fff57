// File: ./src/tui/state.rs
// Manages the application state for the TUI.
use crate::context::AppContext;
use crate::model::{Board, BoardSummary, Card, Column};
use crate::reconciler::Reconciler;
use crate::store::BoardStore;
use ratatui::widgets::ListState;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything needed to work on one open board. Built by the network
/// actor when a board is opened and dropped on both sides when the user
/// navigates back to the board list.
#[derive(Clone)]
pub struct BoardSession {
    pub board_id: String,
    pub store: Arc<Mutex<BoardStore>>,
    pub reconciler: Arc<Reconciler>,
}

impl fmt::Debug for BoardSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardSession")
            .field("board_id", &self.board_id)
            .finish_non_exhaustive()
    }
}

#[derive(PartialEq, Clone, Copy)]
pub enum Screen {
    BoardList,
    Board,
}

#[derive(PartialEq, Clone, Copy)]
pub enum InputMode {
    Normal,
    CreatingBoard,
    RenamingBoard,
    CreatingColumn,
    RenamingColumn,
    CreatingCard,
    EditingCardTitle,
    EditingCardDescription,
}

pub struct AppState {
    // Data
    pub ctx: Arc<dyn AppContext>,
    pub boards: Vec<BoardSummary>,
    pub session: Option<BoardSession>,
    /// Snapshot of the open board the UI renders from, refreshed from the
    /// shared store once per frame. Gestures are described against this
    /// snapshot; the reconciler re-validates them against the live store.
    pub board: Option<Board>,

    // UI State
    pub screen: Screen,
    pub board_list_state: ListState,
    pub column_cursor: usize,
    pub card_cursor: usize,
    pub mode: InputMode,
    pub message: String,
    pub last_error: Option<String>,
    pub loading: bool,
    pub syncing: bool,
    pub show_full_help: bool,
    pub show_card_popup: bool,

    // From config
    pub show_card_meta: bool,
    pub column_width: u16,

    // Input Buffers
    pub input_buffer: String,
    pub cursor_position: usize,
    /// Card targeted by the title/description edit modes.
    pub editing_card_id: Option<String>,
    /// Column targeted by the rename mode.
    pub editing_column_id: Option<String>,
}

impl AppState {
    pub fn new(ctx: Arc<dyn AppContext>) -> Self {
        let mut board_list_state = ListState::default();
        board_list_state.select(Some(0));

        Self {
            ctx,
            boards: vec![],
            session: None,
            board: None,
            screen: Screen::BoardList,
            board_list_state,
            column_cursor: 0,
            card_cursor: 0,
            mode: InputMode::Normal,
            message: "Loading...".to_string(),
            last_error: None,
            loading: true,
            syncing: false,
            show_full_help: false,
            show_card_popup: false,
            show_card_meta: true,
            column_width: 30,
            input_buffer: String::new(),
            cursor_position: 0,
            editing_card_id: None,
            editing_column_id: None,
        }
    }

    /// Refreshes the rendered snapshot from the shared store. `try_lock`
    /// keeps the draw loop non-blocking; the lock is only held across
    /// in-memory mutations, so a miss lasts at most one frame.
    pub fn sync_snapshot(&mut self) {
        if let Some(session) = &self.session {
            self.syncing = session.reconciler.moves_in_flight() > 0;
            if let Ok(store) = session.store.try_lock() {
                self.board = Some(store.snapshot().clone());
            }
        } else {
            self.syncing = false;
            self.board = None;
        }
        self.clamp_cursors();
    }

    pub fn clamp_cursors(&mut self) {
        let Some(board) = &self.board else {
            self.column_cursor = 0;
            self.card_cursor = 0;
            return;
        };
        if board.columns.is_empty() {
            self.column_cursor = 0;
            self.card_cursor = 0;
            return;
        }
        if self.column_cursor >= board.columns.len() {
            self.column_cursor = board.columns.len() - 1;
        }
        let cards = board.columns[self.column_cursor].cards.len();
        if cards == 0 {
            self.card_cursor = 0;
        } else if self.card_cursor >= cards {
            self.card_cursor = cards - 1;
        }
    }

    pub fn selected_board(&self) -> Option<&BoardSummary> {
        self.board_list_state
            .selected()
            .and_then(|i| self.boards.get(i))
    }

    pub fn selected_column(&self) -> Option<&Column> {
        self.board
            .as_ref()
            .and_then(|b| b.columns.get(self.column_cursor))
    }

    pub fn selected_card(&self) -> Option<&Card> {
        self.selected_column()
            .and_then(|c| c.cards.get(self.card_cursor))
    }

    // --- NAVIGATION ---

    pub fn next_board(&mut self) {
        if self.boards.is_empty() {
            return;
        }
        let i = match self.board_list_state.selected() {
            Some(i) => {
                if i >= self.boards.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.board_list_state.select(Some(i));
    }

    pub fn previous_board(&mut self) {
        if self.boards.is_empty() {
            return;
        }
        let i = match self.board_list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.boards.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.board_list_state.select(Some(i));
    }

    pub fn next_card(&mut self) {
        let len = self.selected_column().map(|c| c.cards.len()).unwrap_or(0);
        if len == 0 {
            return;
        }
        self.card_cursor = if self.card_cursor >= len - 1 {
            0
        } else {
            self.card_cursor + 1
        };
    }

    pub fn previous_card(&mut self) {
        let len = self.selected_column().map(|c| c.cards.len()).unwrap_or(0);
        if len == 0 {
            return;
        }
        self.card_cursor = if self.card_cursor == 0 {
            len - 1
        } else {
            self.card_cursor - 1
        };
    }

    pub fn next_column(&mut self) {
        let len = self.board.as_ref().map(|b| b.columns.len()).unwrap_or(0);
        if len == 0 {
            return;
        }
        self.column_cursor = if self.column_cursor >= len - 1 {
            0
        } else {
            self.column_cursor + 1
        };
        self.clamp_cursors();
    }

    pub fn previous_column(&mut self) {
        let len = self.board.as_ref().map(|b| b.columns.len()).unwrap_or(0);
        if len == 0 {
            return;
        }
        self.column_cursor = if self.column_cursor == 0 {
            len - 1
        } else {
            self.column_cursor - 1
        };
        self.clamp_cursors();
    }

    // --- INPUT BUFFER ---

    pub fn begin_input(&mut self, mode: InputMode, prefill: &str) {
        self.mode = mode;
        self.input_buffer = prefill.to_string();
        self.cursor_position = self.input_buffer.chars().count();
    }

    pub fn move_cursor_left(&mut self) {
        let cursor_moved_left = self.cursor_position.saturating_sub(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_left);
    }

    pub fn move_cursor_right(&mut self) {
        let cursor_moved_right = self.cursor_position.saturating_add(1);
        self.cursor_position = self.clamp_cursor(cursor_moved_right);
    }

    pub fn enter_char(&mut self, new_char: char) {
        // Safe insertion for UTF-8 strings
        let byte_index = self
            .input_buffer
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.cursor_position)
            .unwrap_or(self.input_buffer.len());

        self.input_buffer.insert(byte_index, new_char);
        self.move_cursor_right();
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position != 0 {
            let current_index = self.cursor_position;
            let before = self.input_buffer.chars().take(current_index - 1);
            let after = self.input_buffer.chars().skip(current_index);
            self.input_buffer = before.chain(after).collect();
            self.move_cursor_left();
        }
    }

    pub fn reset_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
        self.editing_card_id = None;
        self.editing_column_id = None;
        self.mode = InputMode::Normal;
    }

    fn clamp_cursor(&self, new_cursor_pos: usize) -> usize {
        new_cursor_pos.clamp(0, self.input_buffer.chars().count())
    }
}
