// File: src/store.rs
use crate::model::{Board, Card, Column};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum StoreError {
    #[error("column '{0}' is not on this board")]
    ColumnNotFound(String),
    #[error("no card at index {index} in column '{column_id}'")]
    CardNotFound { column_id: String, index: usize },
    #[error("card '{0}' is not on this board")]
    UnknownCard(String),
    #[error("index {index} is out of range for a column of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("card '{0}' already exists on this board")]
    DuplicateCard(String),
    #[error("column '{0}' already exists on this board")]
    DuplicateColumn(String),
    #[error("column reorder list does not match the board's columns")]
    ReorderMismatch,
}

/// Canonical client-side snapshot of one board.
///
/// The store owns the column/card tree for exactly one board session and is
/// the only place card positions change. Readers get an immutable view via
/// [`snapshot`](Self::snapshot); every mutation goes through a method that
/// validates first and leaves the tree untouched on failure, so no partial
/// state is ever observable.
///
/// Invariants held at the end of every operation:
/// - no card id appears in more than one column,
/// - every card's `column_id` names the column containing it,
/// - column `order` values are gap-free (`0..n`) and match array position.
#[derive(Debug, Clone)]
pub struct BoardStore {
    board: Board,
}

impl BoardStore {
    /// Builds a store from a freshly fetched board. Columns are sorted by
    /// their `order` field and renumbered gap-free; card back-references
    /// are normalized to the containing column. A duplicate card id in the
    /// payload is rejected rather than papered over.
    pub fn new(board: Board) -> Result<Self, StoreError> {
        Ok(Self {
            board: Self::normalized(board)?,
        })
    }

    /// Swaps in a re-fetched board, running the same normalization as
    /// [`new`](Self::new).
    pub fn replace(&mut self, board: Board) -> Result<(), StoreError> {
        self.board = Self::normalized(board)?;
        Ok(())
    }

    fn normalized(mut board: Board) -> Result<Board, StoreError> {
        board.columns.sort_by_key(|c| c.order);
        let mut column_ids: HashSet<String> = HashSet::new();
        let mut card_ids: HashSet<String> = HashSet::new();
        for (idx, column) in board.columns.iter_mut().enumerate() {
            if !column_ids.insert(column.id.clone()) {
                return Err(StoreError::DuplicateColumn(column.id.clone()));
            }
            column.order = idx as u32;
            for card in &mut column.cards {
                if !card_ids.insert(card.id.clone()) {
                    return Err(StoreError::DuplicateCard(card.id.clone()));
                }
                card.column_id = column.id.clone();
            }
        }
        Ok(board)
    }

    // --- Read Access ---

    /// The current immutable view for rendering. Mutation only happens
    /// through the store's own methods.
    pub fn snapshot(&self) -> &Board {
        &self.board
    }

    pub fn board_id(&self) -> &str {
        &self.board.id
    }

    pub fn card_at(&self, column_id: &str, index: usize) -> Option<&Card> {
        self.board.column(column_id).and_then(|c| c.cards.get(index))
    }

    // --- Move Primitives ---

    /// Removes the card at `from` and reinserts it at `to` within one
    /// column. Both indices must lie in `[0, len)`; `from == to` is a
    /// valid no-op. Returns the effective insertion index.
    pub fn move_within_column(
        &mut self,
        column_id: &str,
        from: usize,
        to: usize,
    ) -> Result<usize, StoreError> {
        let col_idx = self
            .board
            .column_index(column_id)
            .ok_or_else(|| StoreError::ColumnNotFound(column_id.to_string()))?;
        let cards = &mut self.board.columns[col_idx].cards;
        let len = cards.len();
        if from >= len {
            return Err(StoreError::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(StoreError::IndexOutOfRange { index: to, len });
        }
        if from != to {
            let card = cards.remove(from);
            cards.insert(to, card);
        }
        debug_assert!(self.board.check_consistency().is_ok());
        Ok(to)
    }

    /// Removes the card at `from` in the source column, points its
    /// `column_id` at the destination and inserts it at `to` there. `to`
    /// is clamped to `[0, dest_len]` as it reads after the removal. When
    /// source and destination are the same column this degenerates to
    /// [`move_within_column`](Self::move_within_column) so the removed
    /// card is not double-counted in the index math. Returns the
    /// effective (post-clamp) insertion index.
    pub fn move_across_columns(
        &mut self,
        source_column_id: &str,
        dest_column_id: &str,
        from: usize,
        to: usize,
    ) -> Result<usize, StoreError> {
        if source_column_id == dest_column_id {
            let len = self
                .board
                .column(source_column_id)
                .ok_or_else(|| StoreError::ColumnNotFound(source_column_id.to_string()))?
                .cards
                .len();
            if from >= len {
                return Err(StoreError::CardNotFound {
                    column_id: source_column_id.to_string(),
                    index: from,
                });
            }
            let clamped = to.min(len - 1);
            return self.move_within_column(source_column_id, from, clamped);
        }

        let src_idx = self
            .board
            .column_index(source_column_id)
            .ok_or_else(|| StoreError::ColumnNotFound(source_column_id.to_string()))?;
        let dest_idx = self
            .board
            .column_index(dest_column_id)
            .ok_or_else(|| StoreError::ColumnNotFound(dest_column_id.to_string()))?;

        let src_len = self.board.columns[src_idx].cards.len();
        if from >= src_len {
            return Err(StoreError::CardNotFound {
                column_id: source_column_id.to_string(),
                index: from,
            });
        }

        let mut card = self.board.columns[src_idx].cards.remove(from);
        card.column_id = dest_column_id.to_string();
        let dest_cards = &mut self.board.columns[dest_idx].cards;
        let clamped = to.min(dest_cards.len());
        dest_cards.insert(clamped, card);
        debug_assert!(self.board.check_consistency().is_ok());
        Ok(clamped)
    }

    // --- Structural Edits (create/update/delete flows) ---

    /// Appends a card to the end of a column. The card's back-reference is
    /// set to the target column regardless of what the caller filled in.
    pub fn insert_card(&mut self, column_id: &str, mut card: Card) -> Result<(), StoreError> {
        if self.board.find_card(&card.id).is_some() {
            return Err(StoreError::DuplicateCard(card.id));
        }
        let col_idx = self
            .board
            .column_index(column_id)
            .ok_or_else(|| StoreError::ColumnNotFound(column_id.to_string()))?;
        card.column_id = column_id.to_string();
        self.board.columns[col_idx].cards.push(card);
        Ok(())
    }

    /// Replaces a card's content in place. Position and owning column are
    /// preserved; only the move primitives relocate cards.
    pub fn update_card(&mut self, card: Card) -> Result<(), StoreError> {
        let (col_idx, card_idx) = self
            .board
            .find_card(&card.id)
            .ok_or_else(|| StoreError::UnknownCard(card.id.clone()))?;
        let column_id = self.board.columns[col_idx].id.clone();
        let slot = &mut self.board.columns[col_idx].cards[card_idx];
        *slot = card;
        slot.column_id = column_id;
        Ok(())
    }

    pub fn remove_card(&mut self, card_id: &str) -> Result<Card, StoreError> {
        let (col_idx, card_idx) = self
            .board
            .find_card(card_id)
            .ok_or_else(|| StoreError::UnknownCard(card_id.to_string()))?;
        Ok(self.board.columns[col_idx].cards.remove(card_idx))
    }

    /// Appends a column at the end of the board and renumbers.
    pub fn insert_column(&mut self, mut column: Column) -> Result<(), StoreError> {
        if self.board.column_index(&column.id).is_some() {
            return Err(StoreError::DuplicateColumn(column.id));
        }
        for card in &column.cards {
            if self.board.find_card(&card.id).is_some() {
                return Err(StoreError::DuplicateCard(card.id.clone()));
            }
        }
        for card in &mut column.cards {
            card.column_id = column.id.clone();
        }
        column.order = self.board.columns.len() as u32;
        self.board.columns.push(column);
        Ok(())
    }

    pub fn rename_column(&mut self, column_id: &str, name: &str) -> Result<(), StoreError> {
        let col_idx = self
            .board
            .column_index(column_id)
            .ok_or_else(|| StoreError::ColumnNotFound(column_id.to_string()))?;
        self.board.columns[col_idx].name = name.to_string();
        Ok(())
    }

    /// Removes a column (cards and all) and renumbers the remainder.
    pub fn remove_column(&mut self, column_id: &str) -> Result<Column, StoreError> {
        let col_idx = self
            .board
            .column_index(column_id)
            .ok_or_else(|| StoreError::ColumnNotFound(column_id.to_string()))?;
        let column = self.board.columns.remove(col_idx);
        self.renumber();
        Ok(column)
    }

    /// Rebuilds the column sequence in the given order. The id list must
    /// be a permutation of the board's current column ids; anything else
    /// leaves the board untouched.
    pub fn reorder_columns(&mut self, ordered_ids: &[String]) -> Result<(), StoreError> {
        if ordered_ids.len() != self.board.columns.len() {
            return Err(StoreError::ReorderMismatch);
        }
        let unique: HashSet<&str> = ordered_ids.iter().map(|s| s.as_str()).collect();
        if unique.len() != ordered_ids.len() {
            return Err(StoreError::ReorderMismatch);
        }
        if !ordered_ids
            .iter()
            .all(|id| self.board.column_index(id).is_some())
        {
            return Err(StoreError::ReorderMismatch);
        }
        self.board.columns.sort_by_key(|c| {
            ordered_ids
                .iter()
                .position(|id| id == &c.id)
                .unwrap_or(usize::MAX)
        });
        self.renumber();
        Ok(())
    }

    fn renumber(&mut self) {
        for (idx, column) in self.board.columns.iter_mut().enumerate() {
            column.order = idx as u32;
        }
    }
}
