// File: src/tui/handlers.rs
// Handles keyboard input and app events for the TUI.
use crate::config::Config;
use crate::model::{CardStatus, Priority};
use crate::reconciler::MoveGesture;
use crate::tui::action::{Action, AppEvent};
use crate::tui::state::{AppState, InputMode, Screen};
use crossterm::event::{KeyCode, KeyEvent};
use strum::IntoEnumIterator;

pub fn handle_app_event(state: &mut AppState, event: AppEvent) {
    match event {
        AppEvent::Status(s) => state.message = s,
        AppEvent::Error(s) => {
            state.last_error = Some(s);
            state.loading = false;
        }
        AppEvent::BoardsLoaded(boards) => {
            state.boards = boards;
            state.loading = false;
            let len = state.boards.len();
            match state.board_list_state.selected() {
                Some(i) if i < len => {}
                _ => state.board_list_state.select(Some(len.saturating_sub(1))),
            }
        }
        AppEvent::SessionOpened(session) => {
            state.session = Some(session);
            state.screen = Screen::Board;
            state.column_cursor = 0;
            state.card_cursor = 0;
            state.show_card_popup = false;
            state.sync_snapshot();
        }
        AppEvent::BoardChanged => state.sync_snapshot(),
    }
}

/// Status cycles forward through the variants; one step past the last
/// clears it back to unset.
fn cycled_status(current: Option<CardStatus>) -> Option<CardStatus> {
    let all: Vec<CardStatus> = CardStatus::iter().collect();
    match current {
        None => all.first().copied(),
        Some(cur) => {
            let pos = all.iter().position(|s| *s == cur)?;
            all.get(pos + 1).copied()
        }
    }
}

fn cycled_priority(current: Option<Priority>, up: bool) -> Option<Priority> {
    let all: Vec<Priority> = Priority::iter().collect();
    match current {
        None => {
            if up {
                all.first().copied()
            } else {
                all.last().copied()
            }
        }
        Some(cur) => {
            let pos = all.iter().position(|p| *p == cur)?;
            if up {
                all.get(pos + 1).copied()
            } else {
                pos.checked_sub(1).and_then(|p| all.get(p)).copied()
            }
        }
    }
}

/// A grab of the selected card dropped one slot sideways. Returns the
/// gesture plus the cursor position tracking the dropped card.
fn lateral_move(state: &AppState, dir: isize) -> Option<(MoveGesture, usize, usize)> {
    let board = state.board.as_ref()?;
    let dest_idx = state.column_cursor.checked_add_signed(dir)?;
    let dest = board.columns.get(dest_idx)?;
    let source = board.columns.get(state.column_cursor)?;
    let card = source.cards.get(state.card_cursor)?;

    let to_index = state.card_cursor.min(dest.cards.len());
    let gesture = MoveGesture {
        card_id: card.id.clone(),
        source_column_id: source.id.clone(),
        dest_column_id: dest.id.clone(),
        from_index: state.card_cursor,
        to_index,
    };
    Some((gesture, dest_idx, to_index))
}

/// The board's column ids with the selected column swapped one slot over.
fn shifted_column_order(state: &AppState, dir: isize) -> Option<(String, Vec<String>, usize)> {
    let board = state.board.as_ref()?;
    let idx = state.column_cursor;
    let new_idx = idx.checked_add_signed(dir)?;
    if new_idx >= board.columns.len() {
        return None;
    }
    let mut ids: Vec<String> = board.columns.iter().map(|c| c.id.clone()).collect();
    ids.swap(idx, new_idx);
    Some((board.id.clone(), ids, new_idx))
}

pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Option<Action> {
    // --- SANITY CHECK ---
    // Prevent out-of-bounds panics if cursor drift happened
    let char_count = state.input_buffer.chars().count();
    if state.cursor_position > char_count {
        state.cursor_position = char_count;
    }

    // The card popup swallows everything except its close keys.
    if state.show_card_popup {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('v') | KeyCode::Char('q') => {
                state.show_card_popup = false;
            }
            _ => {}
        }
        return None;
    }

    match state.mode {
        InputMode::CreatingBoard => match key.code {
            KeyCode::Enter if !state.input_buffer.is_empty() => {
                let name = state.input_buffer.clone();
                state.reset_input();
                return Some(Action::CreateBoard(name));
            }
            KeyCode::Esc => state.reset_input(),
            KeyCode::Char(c) => state.enter_char(c),
            KeyCode::Backspace => state.delete_char(),
            KeyCode::Left => state.move_cursor_left(),
            KeyCode::Right => state.move_cursor_right(),
            _ => {}
        },

        InputMode::RenamingBoard => match key.code {
            KeyCode::Enter if !state.input_buffer.is_empty() => {
                let id = state.selected_board().map(|b| b.id.clone());
                let name = state.input_buffer.clone();
                state.reset_input();
                if let Some(id) = id {
                    return Some(Action::RenameBoard(id, name));
                }
            }
            KeyCode::Esc => state.reset_input(),
            KeyCode::Char(c) => state.enter_char(c),
            KeyCode::Backspace => state.delete_char(),
            KeyCode::Left => state.move_cursor_left(),
            KeyCode::Right => state.move_cursor_right(),
            _ => {}
        },

        InputMode::CreatingColumn => match key.code {
            KeyCode::Enter if !state.input_buffer.is_empty() => {
                let board_id = state.session.as_ref().map(|s| s.board_id.clone());
                let name = state.input_buffer.clone();
                state.reset_input();
                if let Some(board_id) = board_id {
                    return Some(Action::CreateColumn(board_id, name));
                }
            }
            KeyCode::Esc => state.reset_input(),
            KeyCode::Char(c) => state.enter_char(c),
            KeyCode::Backspace => state.delete_char(),
            KeyCode::Left => state.move_cursor_left(),
            KeyCode::Right => state.move_cursor_right(),
            _ => {}
        },

        InputMode::RenamingColumn => match key.code {
            KeyCode::Enter if !state.input_buffer.is_empty() => {
                let id = state.editing_column_id.clone();
                let name = state.input_buffer.clone();
                state.reset_input();
                if let Some(id) = id {
                    return Some(Action::RenameColumn(id, name));
                }
            }
            KeyCode::Esc => state.reset_input(),
            KeyCode::Char(c) => state.enter_char(c),
            KeyCode::Backspace => state.delete_char(),
            KeyCode::Left => state.move_cursor_left(),
            KeyCode::Right => state.move_cursor_right(),
            _ => {}
        },

        InputMode::CreatingCard => match key.code {
            KeyCode::Enter if !state.input_buffer.is_empty() => {
                let column_id = state.selected_column().map(|c| c.id.clone());
                let title = state.input_buffer.clone();
                state.reset_input();
                if let Some(column_id) = column_id {
                    return Some(Action::CreateCard(column_id, title));
                }
            }
            KeyCode::Esc => state.reset_input(),
            KeyCode::Char(c) => state.enter_char(c),
            KeyCode::Backspace => state.delete_char(),
            KeyCode::Left => state.move_cursor_left(),
            KeyCode::Right => state.move_cursor_right(),
            _ => {}
        },

        InputMode::EditingCardTitle => match key.code {
            KeyCode::Enter if !state.input_buffer.is_empty() => {
                let updated = state.editing_card_id.clone().and_then(|id| {
                    let board = state.board.as_ref()?;
                    let (ci, ri) = board.find_card(&id)?;
                    let mut card = board.columns.get(ci)?.cards.get(ri)?.clone();
                    card.title = state.input_buffer.clone();
                    Some(card)
                });
                state.reset_input();
                if let Some(card) = updated {
                    return Some(Action::UpdateCard(card));
                }
            }
            KeyCode::Esc => state.reset_input(),
            KeyCode::Char(c) => state.enter_char(c),
            KeyCode::Backspace => state.delete_char(),
            KeyCode::Left => state.move_cursor_left(),
            KeyCode::Right => state.move_cursor_right(),
            _ => {}
        },

        InputMode::EditingCardDescription => match key.code {
            // An empty buffer is a valid commit here: it clears the text.
            KeyCode::Enter => {
                let updated = state.editing_card_id.clone().and_then(|id| {
                    let board = state.board.as_ref()?;
                    let (ci, ri) = board.find_card(&id)?;
                    let mut card = board.columns.get(ci)?.cards.get(ri)?.clone();
                    card.description = state.input_buffer.clone();
                    Some(card)
                });
                state.reset_input();
                if let Some(card) = updated {
                    return Some(Action::UpdateCard(card));
                }
            }
            KeyCode::Esc => state.reset_input(),
            KeyCode::Char(c) => state.enter_char(c),
            KeyCode::Backspace => state.delete_char(),
            KeyCode::Left => state.move_cursor_left(),
            KeyCode::Right => state.move_cursor_right(),
            _ => {}
        },

        InputMode::Normal => match state.screen {
            Screen::BoardList => match key.code {
                KeyCode::Char('q') => return Some(Action::Quit),
                KeyCode::Char('?') => state.show_full_help = !state.show_full_help,
                KeyCode::Esc => {
                    if state.show_full_help {
                        state.show_full_help = false;
                    } else if state.last_error.is_some() {
                        state.last_error = None;
                    }
                }
                KeyCode::Char('j') | KeyCode::Down => state.next_board(),
                KeyCode::Char('k') | KeyCode::Up => state.previous_board(),
                KeyCode::Enter | KeyCode::Char('l') => {
                    if let Some(id) = state.selected_board().map(|b| b.id.clone()) {
                        state.message = "Opening board...".to_string();
                        return Some(Action::OpenBoard(id));
                    }
                }
                KeyCode::Char('a') => state.begin_input(InputMode::CreatingBoard, ""),
                KeyCode::Char('e') => {
                    let name = state.selected_board().map(|b| b.name.clone());
                    if let Some(name) = name {
                        state.begin_input(InputMode::RenamingBoard, &name);
                    }
                }
                KeyCode::Char('D') => {
                    if let Some(id) = state.selected_board().map(|b| b.id.clone()) {
                        return Some(Action::DeleteBoard(id));
                    }
                }
                KeyCode::Char('r') => return Some(Action::RefreshBoards),
                _ => {}
            },

            Screen::Board => match key.code {
                KeyCode::Char('q') => return Some(Action::Quit),
                KeyCode::Char('?') => state.show_full_help = !state.show_full_help,
                KeyCode::Esc => {
                    if state.show_full_help {
                        state.show_full_help = false;
                    } else if state.last_error.is_some() {
                        state.last_error = None;
                    } else {
                        state.session = None;
                        state.board = None;
                        state.screen = Screen::BoardList;
                        return Some(Action::CloseBoard);
                    }
                }
                KeyCode::Char('h') | KeyCode::Left => state.previous_column(),
                KeyCode::Char('l') | KeyCode::Right => state.next_column(),
                KeyCode::Char('j') | KeyCode::Down => state.next_card(),
                KeyCode::Char('k') | KeyCode::Up => state.previous_card(),

                KeyCode::Char('J') => {
                    let gesture = state.selected_column().and_then(|col| {
                        let from = state.card_cursor;
                        let card = col.cards.get(from)?;
                        if from + 1 >= col.cards.len() {
                            return None;
                        }
                        Some(MoveGesture {
                            card_id: card.id.clone(),
                            source_column_id: col.id.clone(),
                            dest_column_id: col.id.clone(),
                            from_index: from,
                            to_index: from + 1,
                        })
                    });
                    if let Some(g) = gesture {
                        state.card_cursor += 1;
                        return Some(Action::MoveCard(g));
                    }
                }
                KeyCode::Char('K') => {
                    let gesture = state.selected_column().and_then(|col| {
                        let from = state.card_cursor;
                        let card = col.cards.get(from)?;
                        let to = from.checked_sub(1)?;
                        Some(MoveGesture {
                            card_id: card.id.clone(),
                            source_column_id: col.id.clone(),
                            dest_column_id: col.id.clone(),
                            from_index: from,
                            to_index: to,
                        })
                    });
                    if let Some(g) = gesture {
                        state.card_cursor -= 1;
                        return Some(Action::MoveCard(g));
                    }
                }
                KeyCode::Char('H') => {
                    if let Some((gesture, col, card)) = lateral_move(state, -1) {
                        state.column_cursor = col;
                        state.card_cursor = card;
                        return Some(Action::MoveCard(gesture));
                    }
                }
                KeyCode::Char('L') => {
                    if let Some((gesture, col, card)) = lateral_move(state, 1) {
                        state.column_cursor = col;
                        state.card_cursor = card;
                        return Some(Action::MoveCard(gesture));
                    }
                }

                KeyCode::Char('<') => {
                    if let Some((board_id, ids, new_idx)) = shifted_column_order(state, -1) {
                        state.column_cursor = new_idx;
                        return Some(Action::ReorderColumns(board_id, ids));
                    }
                }
                KeyCode::Char('>') => {
                    if let Some((board_id, ids, new_idx)) = shifted_column_order(state, 1) {
                        state.column_cursor = new_idx;
                        return Some(Action::ReorderColumns(board_id, ids));
                    }
                }

                KeyCode::Char('a') => {
                    if state.selected_column().is_some() {
                        state.begin_input(InputMode::CreatingCard, "");
                    }
                }
                KeyCode::Char('c') => state.begin_input(InputMode::CreatingColumn, ""),
                KeyCode::Char('e') => {
                    let card = state
                        .selected_card()
                        .map(|c| (c.id.clone(), c.title.clone()));
                    if let Some((id, title)) = card {
                        state.editing_card_id = Some(id);
                        state.begin_input(InputMode::EditingCardTitle, &title);
                    }
                }
                KeyCode::Char('E') => {
                    let card = state
                        .selected_card()
                        .map(|c| (c.id.clone(), c.description.clone()));
                    if let Some((id, description)) = card {
                        state.editing_card_id = Some(id);
                        state.begin_input(InputMode::EditingCardDescription, &description);
                    }
                }
                KeyCode::Char('R') => {
                    let column = state
                        .selected_column()
                        .map(|c| (c.id.clone(), c.name.clone()));
                    if let Some((id, name)) = column {
                        state.editing_column_id = Some(id);
                        state.begin_input(InputMode::RenamingColumn, &name);
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(id) = state.selected_card().map(|c| c.id.clone()) {
                        return Some(Action::DeleteCard(id));
                    }
                }
                KeyCode::Char('D') => {
                    if let Some(id) = state.selected_column().map(|c| c.id.clone()) {
                        return Some(Action::DeleteColumn(id));
                    }
                }
                KeyCode::Char('v') | KeyCode::Enter => {
                    if state.selected_card().is_some() {
                        state.show_card_popup = true;
                    }
                }
                KeyCode::Char('m') => {
                    state.show_card_meta = !state.show_card_meta;
                    if let Ok(mut cfg) = Config::load(state.ctx.as_ref()) {
                        cfg.show_card_meta = state.show_card_meta;
                        let _ = cfg.save(state.ctx.as_ref());
                    }
                }
                KeyCode::Char(' ') => {
                    if let Some(mut card) = state.selected_card().cloned() {
                        card.status = cycled_status(card.status);
                        return Some(Action::UpdateCard(card));
                    }
                }
                KeyCode::Char('+') => {
                    if let Some(mut card) = state.selected_card().cloned() {
                        card.priority = cycled_priority(card.priority, true);
                        return Some(Action::UpdateCard(card));
                    }
                }
                KeyCode::Char('-') => {
                    if let Some(mut card) = state.selected_card().cloned() {
                        card.priority = cycled_priority(card.priority, false);
                        return Some(Action::UpdateCard(card));
                    }
                }
                KeyCode::Char('r') => {
                    if let Some(id) = state.session.as_ref().map(|s| s.board_id.clone()) {
                        return Some(Action::RefreshBoard(id));
                    }
                }
                _ => {}
            },
        },
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;
    use crate::model::{Board, BoardSummary, Card, Column};
    use crossterm::event::{KeyEvent, KeyModifiers};
    use std::sync::Arc;

    fn state_with_board() -> AppState {
        let mut board = Board::new("b1", "Sprint");
        let mut todo = Column::new("c1", "Todo", 0);
        todo.cards.push(Card::new("card-a", "First", "c1"));
        todo.cards.push(Card::new("card-b", "Second", "c1"));
        let done = Column::new("c2", "Done", 1);
        board.columns.push(todo);
        board.columns.push(done);

        let mut state = AppState::new(Arc::new(TestContext::new()));
        state.screen = Screen::Board;
        state.board = Some(board);
        state
    }

    fn press(state: &mut AppState, c: char) -> Option<Action> {
        handle_key_event(
            KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE),
            state,
        )
    }

    #[test]
    fn shift_j_emits_a_move_one_slot_down() {
        let mut state = state_with_board();
        let action = press(&mut state, 'J');
        match action {
            Some(Action::MoveCard(g)) => {
                assert_eq!(g.card_id, "card-a");
                assert_eq!(g.from_index, 0);
                assert_eq!(g.to_index, 1);
                assert!(g.is_within_column());
            }
            other => panic!("expected a move, got {:?}", other),
        }
        assert_eq!(state.card_cursor, 1);
    }

    #[test]
    fn shift_j_on_last_card_does_nothing() {
        let mut state = state_with_board();
        state.card_cursor = 1;
        assert!(press(&mut state, 'J').is_none());
        assert_eq!(state.card_cursor, 1);
    }

    #[test]
    fn shift_l_targets_the_next_column_clamped() {
        let mut state = state_with_board();
        state.card_cursor = 1;
        let action = press(&mut state, 'L');
        match action {
            Some(Action::MoveCard(g)) => {
                assert_eq!(g.source_column_id, "c1");
                assert_eq!(g.dest_column_id, "c2");
                assert_eq!(g.from_index, 1);
                // Destination is empty, so the drop slot clamps to 0.
                assert_eq!(g.to_index, 0);
            }
            other => panic!("expected a move, got {:?}", other),
        }
        assert_eq!(state.column_cursor, 1);
        assert_eq!(state.card_cursor, 0);
    }

    #[test]
    fn column_shift_emits_the_full_permutation() {
        let mut state = state_with_board();
        let action = press(&mut state, '>');
        match action {
            Some(Action::ReorderColumns(board_id, ids)) => {
                assert_eq!(board_id, "b1");
                assert_eq!(ids, vec!["c2".to_string(), "c1".to_string()]);
            }
            other => panic!("expected a reorder, got {:?}", other),
        }
        assert_eq!(state.column_cursor, 1);
    }

    #[test]
    fn meta_toggle_flips_and_persists() {
        let mut state = state_with_board();
        Config::default().save(state.ctx.as_ref()).unwrap();

        press(&mut state, 'm');
        assert!(!state.show_card_meta);

        let cfg = Config::load(state.ctx.as_ref()).unwrap();
        assert!(!cfg.show_card_meta);
    }

    #[test]
    fn status_cycles_through_variants_and_clears() {
        assert_eq!(cycled_status(None), Some(CardStatus::NotStarted));
        assert_eq!(
            cycled_status(Some(CardStatus::NotStarted)),
            Some(CardStatus::InResearch)
        );
        assert_eq!(cycled_status(Some(CardStatus::Completed)), None);
    }

    #[test]
    fn error_event_is_kept_until_dismissed() {
        let mut state = state_with_board();
        handle_app_event(&mut state, AppEvent::Error("boom".to_string()));
        assert_eq!(state.last_error.as_deref(), Some("boom"));

        press(&mut state, 'j');
        assert_eq!(state.last_error.as_deref(), Some("boom"));

        handle_key_event(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), &mut state);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn boards_loaded_clamps_the_selection() {
        let mut state = state_with_board();
        state.board_list_state.select(Some(5));
        let boards = vec![BoardSummary {
            id: "b1".to_string(),
            name: "Sprint".to_string(),
            description: String::new(),
            members: None,
            thumbnail_color: None,
            last_modified: None,
        }];
        handle_app_event(&mut state, AppEvent::BoardsLoaded(boards));
        assert_eq!(state.board_list_state.selected(), Some(0));
    }
}
