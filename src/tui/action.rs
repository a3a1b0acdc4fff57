// Defines actions and events for TUI interaction and state updates.
use crate::model::{BoardSummary, Card};
use crate::reconciler::MoveGesture;
use crate::tui::state::BoardSession;

#[derive(Debug)]
pub enum Action {
    OpenBoard(String),
    CloseBoard,
    MoveCard(MoveGesture),
    CreateBoard(String),
    RenameBoard(String, String), // (board_id, new name)
    DeleteBoard(String),
    CreateColumn(String, String), // (board_id, name)
    RenameColumn(String, String), // (column_id, new name)
    DeleteColumn(String),
    ReorderColumns(String, Vec<String>), // (board_id, full column order)
    CreateCard(String, String), // (column_id, title)
    UpdateCard(Card),
    DeleteCard(String),
    RefreshBoards,
    RefreshBoard(String),
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    BoardsLoaded(Vec<BoardSummary>),
    /// A board was opened; the UI takes the shared store and reconciler.
    SessionOpened(BoardSession),
    /// The shared store changed actor-side; the UI should resync its
    /// snapshot and clamp its cursors.
    BoardChanged,
    Error(String),
    Status(String),
}
