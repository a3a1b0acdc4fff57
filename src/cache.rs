// Caching mechanism for storing remote boards locally.
//
// ⚠️ VERSION BUMP REQUIRED:
// Changes to Board or its nested types (Column, Card, ...) require
// incrementing CACHE_VERSION below to invalidate stale caches.
use crate::context::AppContext;
use crate::model::{Board, BoardSummary};
use crate::storage::LocalStorage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

// Increment whenever the cached structs change shape to invalidate old caches.
const CACHE_VERSION: u32 = 2; // last update: card status gained "In Research"

#[derive(Serialize, Deserialize)]
struct BoardCache {
    // If this field is missing in the JSON (old cache), it defaults to 0
    // and the cache is discarded.
    #[serde(default)]
    version: u32,
    board: Board,
}

#[derive(Serialize, Deserialize)]
struct BoardListCache {
    #[serde(default)]
    version: u32,
    boards: Vec<BoardSummary>,
}

pub struct Cache;

impl Cache {
    fn get_path(ctx: &dyn AppContext, board_id: &str) -> Option<PathBuf> {
        ctx.get_board_cache_dir().map(|dir| {
            let mut hasher = DefaultHasher::new();
            board_id.hash(&mut hasher);
            let filename = format!("board_{:x}.json", hasher.finish());
            dir.join(filename)
        })
    }

    pub fn save_board(ctx: &dyn AppContext, board: &Board) -> Result<()> {
        if let Some(path) = Self::get_path(ctx, &board.id) {
            LocalStorage::with_lock(&path, || {
                let data = BoardCache {
                    version: CACHE_VERSION,
                    board: board.clone(),
                };
                let json = serde_json::to_string_pretty(&data)?;
                LocalStorage::atomic_write(&path, json)?;
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Returns the cached board, or `None` when there is no usable cache
    /// (absent, unreadable or written by an incompatible version). A stale
    /// version is never surfaced; the caller refetches instead.
    pub fn load_board(ctx: &dyn AppContext, board_id: &str) -> Result<Option<Board>> {
        if let Some(path) = Self::get_path(ctx, board_id)
            && path.exists()
        {
            return LocalStorage::with_lock(&path, || {
                let json = fs::read_to_string(&path)?;
                if let Ok(cache) = serde_json::from_str::<BoardCache>(&json)
                    && cache.version == CACHE_VERSION
                {
                    return Ok(Some(cache.board));
                }
                Ok(None)
            });
        }
        Ok(None)
    }

    pub fn save_board_list(ctx: &dyn AppContext, boards: &[BoardSummary]) -> Result<()> {
        if let Some(path) = ctx.get_board_list_cache_path() {
            LocalStorage::with_lock(&path, || {
                let data = BoardListCache {
                    version: CACHE_VERSION,
                    boards: boards.to_vec(),
                };
                let json = serde_json::to_string_pretty(&data)?;
                LocalStorage::atomic_write(&path, json)?;
                Ok(())
            })?;
        }
        Ok(())
    }

    pub fn load_board_list(ctx: &dyn AppContext) -> Result<Vec<BoardSummary>> {
        if let Some(path) = ctx.get_board_list_cache_path()
            && path.exists()
        {
            return LocalStorage::with_lock(&path, || {
                let json = fs::read_to_string(&path)?;
                if let Ok(cache) = serde_json::from_str::<BoardListCache>(&json)
                    && cache.version == CACHE_VERSION
                {
                    return Ok(cache.boards);
                }
                // Version mismatch or parse failure: treat the cache as
                // empty to force a refetch.
                Ok(vec![])
            });
        }
        Ok(vec![])
    }
}
