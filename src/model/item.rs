// File: ./src/model/item.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::EnumIter;

// --- PEOPLE ---

/// A card assignee. The backend's user record minus anything
/// account-related (we are a board client, not an account manager).
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

// --- CARD METADATA ---

/// Wire values are the backend's uppercase strings (LOW/MEDIUM/HIGH).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Lower key sorts first (most urgent on top).
    pub fn sort_key(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" | "l" => Ok(Priority::Low),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "high" | "h" => Ok(Priority::High),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Workflow status of a card. Wire values keep the backend's
/// human-readable spellings ("Not Started", "In Research", ...).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, EnumIter)]
pub enum CardStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Research")]
    InResearch,
    #[serde(rename = "On Track")]
    OnTrack,
    #[serde(rename = "Completed")]
    Completed,
}

impl CardStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CardStatus::NotStarted => "Not Started",
            CardStatus::InResearch => "In Research",
            CardStatus::OnTrack => "On Track",
            CardStatus::Completed => "Completed",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, CardStatus::Completed)
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- BOARD TREE ---

/// A single kanban card. `column_id` back-references the column whose
/// sequence currently contains the card; position within that column is
/// the array index (there is no per-card order field).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<CardStatus>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignees: Vec<User>,
    pub column_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Card {
    pub fn new(id: &str, title: &str, column_id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            priority: None,
            status: None,
            due_date: None,
            assignees: Vec::new(),
            column_id: column_id.to_string(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// A named, ordered bucket of cards. `order` is the column's position in
/// the board (kept gap-free by the store); card order is array position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default, rename = "wip")]
    pub wip_limit: Option<u32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub board_id: Option<String>,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Column {
    pub fn new(id: &str, name: &str, order: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            order,
            wip_limit: None,
            color: None,
            board_id: None,
            cards: Vec::new(),
        }
    }

    pub fn over_wip_limit(&self) -> bool {
        match self.wip_limit {
            Some(limit) => self.cards.len() as u32 > limit,
            None => false,
        }
    }
}

/// One kanban workspace: an ordered collection of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Board {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            columns: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Locates a card anywhere on the board.
    /// Returns (column index, card index within that column).
    pub fn find_card(&self, card_id: &str) -> Option<(usize, usize)> {
        for (col_idx, column) in self.columns.iter().enumerate() {
            if let Some(card_idx) = column.cards.iter().position(|c| c.id == card_id) {
                return Some((col_idx, card_idx));
            }
        }
        None
    }

    pub fn column_index(&self, column_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == column_id)
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }

    /// Verifies the two structural invariants: no card id appears in more
    /// than one column, and each card's `column_id` names its container.
    /// Returns a description of the first violation found.
    pub fn check_consistency(&self) -> Result<(), String> {
        let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for column in &self.columns {
            for card in &column.cards {
                if !seen.insert(card.id.as_str()) {
                    return Err(format!("card '{}' appears in more than one column", card.id));
                }
                if card.column_id != column.id {
                    return Err(format!(
                        "card '{}' sits in column '{}' but points at '{}'",
                        card.id, column.id, card.column_id
                    ));
                }
            }
        }
        Ok(())
    }
}

/// The board-list endpoint's shape: board metadata without columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub members: Option<u32>,
    #[serde(default)]
    pub thumbnail_color: Option<String>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}
