// File: ./src/model/mod.rs
pub mod item;

pub use item::{Board, BoardSummary, Card, CardStatus, Column, Priority, User};
