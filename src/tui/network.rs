// Manages background network operations for the TUI.
//
// The actor owns the `BoardClient` and the authoritative copy of each
// open `BoardSession`. Actions arrive over a channel and are handled one
// at a time, so remote calls never interleave; the UI stays responsive
// because it only ever renders snapshots.
use crate::cache::Cache;
use crate::client::BoardClient;
use crate::config::Config;
use crate::context::AppContext;
use crate::model::Board;
use crate::reconciler::{GestureError, MoveOutcome, Reconciler};
use crate::store::BoardStore;
use crate::system;
use crate::tui::action::{Action, AppEvent};
use crate::tui::state::BoardSession;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{Receiver, Sender};

fn build_session(client: &BoardClient, board: Board) -> Result<BoardSession, crate::store::StoreError> {
    let board_id = board.id.clone();
    let store = Arc::new(Mutex::new(BoardStore::new(board)?));
    let reconciler = Arc::new(Reconciler::new(store.clone(), Arc::new(client.clone())));
    Ok(BoardSession {
        board_id,
        store,
        reconciler,
    })
}

/// Writes the session's current arrangement to the cache for the next
/// fast-start. Failures are logged, never surfaced.
async fn persist_session(ctx: &dyn AppContext, session: &BoardSession) {
    let store = session.store.lock().await;
    if let Err(e) = Cache::save_board(ctx, store.snapshot()) {
        log::warn!("board cache write failed: {e}");
    }
}

/// Opens a board: cached copy first for an instant paint, then the fresh
/// copy from the server. Returns the session the actor keeps as its copy.
async fn open_board(
    ctx: &dyn AppContext,
    client: &BoardClient,
    event_tx: &Sender<AppEvent>,
    board_id: &str,
) -> Option<BoardSession> {
    let mut session: Option<BoardSession> = None;

    if let Ok(Some(cached)) = Cache::load_board(ctx, board_id) {
        match build_session(client, cached) {
            Ok(s) => {
                let _ = event_tx.send(AppEvent::SessionOpened(s.clone())).await;
                let _ = event_tx
                    .send(AppEvent::Status("Syncing...".to_string()))
                    .await;
                session = Some(s);
            }
            Err(e) => log::warn!("cached board {board_id} unusable: {e}"),
        }
    }

    match client.get_board(board_id).await {
        Ok(fresh) => {
            if let Some(s) = &session {
                let replaced = s.store.lock().await.replace(fresh);
                if let Err(e) = replaced {
                    let _ = event_tx
                        .send(AppEvent::Error(format!("Board is inconsistent: {}", e)))
                        .await;
                    return session;
                }
                let _ = event_tx.send(AppEvent::BoardChanged).await;
            } else {
                match build_session(client, fresh) {
                    Ok(s) => {
                        let _ = event_tx.send(AppEvent::SessionOpened(s.clone())).await;
                        session = Some(s);
                    }
                    Err(e) => {
                        let _ = event_tx
                            .send(AppEvent::Error(format!("Board is inconsistent: {}", e)))
                            .await;
                        return None;
                    }
                }
            }
            if let Some(s) = &session {
                persist_session(ctx, s).await;
            }
            let _ = event_tx.send(AppEvent::Status("Ready.".to_string())).await;
        }
        Err(e) => {
            if session.is_some() {
                // Cached copy stays on screen for offline viewing.
                let _ = event_tx
                    .send(AppEvent::Error(format!("Refresh failed: {}", e)))
                    .await;
            } else {
                let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
            }
        }
    }

    session
}

pub async fn run_network_actor(
    ctx: Arc<dyn AppContext>,
    config: Config,
    default_board: Option<String>,
    mut action_rx: Receiver<Action>,
    event_tx: Sender<AppEvent>,
) {
    // 0. Cached board list immediately, for UI fast-start.
    if let Ok(cached) = Cache::load_board_list(ctx.as_ref())
        && !cached.is_empty()
    {
        let _ = event_tx.send(AppEvent::BoardsLoaded(cached)).await;
    }

    // 1. Client from config. A broken setup degrades to the offline
    // client so cached boards stay browsable.
    let client = match BoardClient::new(
        &config.url,
        &config.username,
        &config.password,
        config.token.as_deref(),
        config.allow_insecure_certs,
    ) {
        Ok(c) => c,
        Err(e) => {
            let _ = event_tx
                .send(AppEvent::Error(format!("Client setup failed: {}", e)))
                .await;
            match BoardClient::new("", "", "", None, false) {
                Ok(c) => c,
                Err(_) => return,
            }
        }
    };

    let _ = event_tx
        .send(AppEvent::Status("Syncing...".to_string()))
        .await;

    // 2. Fresh board list, then warm the per-board caches in the
    // background of the user's first interaction.
    let mut boards = Vec::new();
    match client.get_boards().await {
        Ok(list) => {
            if let Err(e) = Cache::save_board_list(ctx.as_ref(), &list) {
                log::warn!("board list cache write failed: {e}");
            }
            boards = list.clone();
            let _ = event_tx.send(AppEvent::BoardsLoaded(list)).await;
            let _ = event_tx.send(AppEvent::Status("Ready.".to_string())).await;

            for (_, board) in client.prefetch_boards(&boards).await {
                if let Err(e) = Cache::save_board(ctx.as_ref(), &board) {
                    log::warn!("board cache write failed: {e}");
                }
            }
        }
        Err(e) => {
            let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
        }
    }

    // The actor's copy of the open session. Dropped on CloseBoard; the
    // UI drops its own clone when it leaves the board screen.
    let mut open: Option<BoardSession> = None;

    // 3. Startup board from --board / config, by id or name.
    if let Some(wanted) = default_board {
        let resolved = boards
            .iter()
            .find(|b| b.id == wanted || b.name == wanted)
            .map(|b| b.id.clone());
        match resolved {
            Some(id) => open = open_board(ctx.as_ref(), &client, &event_tx, &id).await,
            None => {
                let _ = event_tx
                    .send(AppEvent::Error(format!("No board named '{}'", wanted)))
                    .await;
            }
        }
    }

    // 4. Action Loop
    while let Some(action) = action_rx.recv().await {
        match action {
            Action::Quit => break,

            Action::OpenBoard(id) => {
                open = open_board(ctx.as_ref(), &client, &event_tx, &id).await;
            }

            Action::CloseBoard => {
                open = None;
            }

            Action::MoveCard(gesture) => {
                let Some(session) = &open else { continue };
                // Title for the failure notification, read before the
                // move settles so rollback cannot race the lookup.
                let card_title = {
                    let store = session.store.lock().await;
                    store
                        .card_at(&gesture.source_column_id, gesture.from_index)
                        .map(|c| c.title.clone())
                };
                match session.reconciler.handle_drop(gesture).await {
                    Ok(MoveOutcome::Committed) => {
                        persist_session(ctx.as_ref(), session).await;
                        let _ = event_tx.send(AppEvent::BoardChanged).await;
                        let _ = event_tx.send(AppEvent::Status("Synced.".to_string())).await;
                    }
                    Ok(MoveOutcome::RolledBack(err)) => {
                        let title = card_title.as_deref().unwrap_or("card");
                        system::notify_move_failed(title, &err.to_string());
                        let _ = event_tx.send(AppEvent::BoardChanged).await;
                        let _ = event_tx
                            .send(AppEvent::Error(format!("Move failed: {}", err)))
                            .await;
                    }
                    Ok(MoveOutcome::Noop) => {}
                    Err(GestureError::Stale) => {
                        let _ = event_tx
                            .send(AppEvent::Status(
                                "Board changed mid-move; nothing done.".to_string(),
                            ))
                            .await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                    }
                }
            }

            Action::CreateBoard(name) => match client.create_board(&name, "").await {
                Ok(_) => {
                    refresh_board_list(ctx.as_ref(), &client, &event_tx, &mut boards).await;
                    let _ = event_tx.send(AppEvent::Status("Created.".to_string())).await;
                }
                Err(e) => {
                    let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                }
            },

            Action::RenameBoard(id, name) => {
                let description = boards
                    .iter()
                    .find(|b| b.id == id)
                    .map(|b| b.description.clone())
                    .unwrap_or_default();
                match client.update_board(&id, &name, &description).await {
                    Ok(_) => {
                        refresh_board_list(ctx.as_ref(), &client, &event_tx, &mut boards).await;
                        let _ = event_tx.send(AppEvent::Status("Renamed.".to_string())).await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                    }
                }
            }

            Action::DeleteBoard(id) => match client.delete_board(&id).await {
                Ok(()) => {
                    refresh_board_list(ctx.as_ref(), &client, &event_tx, &mut boards).await;
                    let _ = event_tx.send(AppEvent::Status("Deleted.".to_string())).await;
                }
                Err(e) => {
                    let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                }
            },

            Action::CreateColumn(board_id, name) => {
                match client.create_column(&board_id, &name).await {
                    Ok(column) => {
                        if let Some(session) = open.as_ref().filter(|s| s.board_id == board_id) {
                            let applied = session.store.lock().await.insert_column(column);
                            if let Err(e) = applied {
                                log::warn!("column insert desynced: {e}");
                            }
                            persist_session(ctx.as_ref(), session).await;
                            let _ = event_tx.send(AppEvent::BoardChanged).await;
                        }
                        let _ = event_tx
                            .send(AppEvent::Status("Column added.".to_string()))
                            .await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                    }
                }
            }

            Action::RenameColumn(column_id, name) => {
                match client.rename_column(&column_id, &name).await {
                    Ok(column) => {
                        if let Some(session) = &open {
                            let applied = session
                                .store
                                .lock()
                                .await
                                .rename_column(&column_id, &column.name);
                            if let Err(e) = applied {
                                log::warn!("column rename desynced: {e}");
                            }
                            persist_session(ctx.as_ref(), session).await;
                            let _ = event_tx.send(AppEvent::BoardChanged).await;
                        }
                        let _ = event_tx.send(AppEvent::Status("Renamed.".to_string())).await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                    }
                }
            }

            Action::DeleteColumn(column_id) => match client.delete_column(&column_id).await {
                Ok(()) => {
                    if let Some(session) = &open {
                        let applied = session.store.lock().await.remove_column(&column_id);
                        if let Err(e) = applied {
                            log::warn!("column delete desynced: {e}");
                        }
                        persist_session(ctx.as_ref(), session).await;
                        let _ = event_tx.send(AppEvent::BoardChanged).await;
                    }
                    let _ = event_tx.send(AppEvent::Status("Deleted.".to_string())).await;
                }
                Err(e) => {
                    let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                }
            },

            Action::ReorderColumns(board_id, column_ids) => {
                match client.reorder_columns(&board_id, &column_ids).await {
                    Ok(()) => {
                        if let Some(session) = open.as_ref().filter(|s| s.board_id == board_id) {
                            let applied =
                                session.store.lock().await.reorder_columns(&column_ids);
                            if let Err(e) = applied {
                                log::warn!("column reorder desynced: {e}");
                            }
                            persist_session(ctx.as_ref(), session).await;
                            let _ = event_tx.send(AppEvent::BoardChanged).await;
                        }
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                    }
                }
            }

            Action::CreateCard(column_id, title) => {
                match client.create_card(&column_id, &title).await {
                    Ok(card) => {
                        if let Some(session) = &open {
                            let applied = session.store.lock().await.insert_card(&column_id, card);
                            if let Err(e) = applied {
                                log::warn!("card insert desynced: {e}");
                            }
                            persist_session(ctx.as_ref(), session).await;
                            let _ = event_tx.send(AppEvent::BoardChanged).await;
                        }
                        let _ = event_tx.send(AppEvent::Status("Created.".to_string())).await;
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                    }
                }
            }

            Action::UpdateCard(card) => match client.update_card(&card).await {
                Ok(updated) => {
                    if let Some(session) = &open {
                        let applied = session.store.lock().await.update_card(updated);
                        if let Err(e) = applied {
                            log::warn!("card update desynced: {e}");
                        }
                        persist_session(ctx.as_ref(), session).await;
                        let _ = event_tx.send(AppEvent::BoardChanged).await;
                    }
                    let _ = event_tx.send(AppEvent::Status("Saved.".to_string())).await;
                }
                Err(e) => {
                    let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                }
            },

            Action::DeleteCard(card_id) => match client.delete_card(&card_id).await {
                Ok(()) => {
                    if let Some(session) = &open {
                        let applied = session.store.lock().await.remove_card(&card_id);
                        if let Err(e) = applied {
                            log::warn!("card delete desynced: {e}");
                        }
                        persist_session(ctx.as_ref(), session).await;
                        let _ = event_tx.send(AppEvent::BoardChanged).await;
                    }
                    let _ = event_tx.send(AppEvent::Status("Deleted.".to_string())).await;
                }
                Err(e) => {
                    let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                }
            },

            Action::RefreshBoards => {
                let _ = event_tx
                    .send(AppEvent::Status("Refreshing...".to_string()))
                    .await;
                refresh_board_list(ctx.as_ref(), &client, &event_tx, &mut boards).await;
            }

            Action::RefreshBoard(id) => {
                let _ = event_tx
                    .send(AppEvent::Status("Refreshing...".to_string()))
                    .await;
                match client.get_board(&id).await {
                    Ok(fresh) => {
                        if let Some(session) = open.as_ref().filter(|s| s.board_id == id) {
                            let replaced = session.store.lock().await.replace(fresh);
                            match replaced {
                                Ok(()) => {
                                    persist_session(ctx.as_ref(), session).await;
                                    let _ = event_tx.send(AppEvent::BoardChanged).await;
                                    let _ = event_tx
                                        .send(AppEvent::Status("Refreshed.".to_string()))
                                        .await;
                                }
                                Err(e) => {
                                    let _ = event_tx
                                        .send(AppEvent::Error(format!(
                                            "Board is inconsistent: {}",
                                            e
                                        )))
                                        .await;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
                    }
                }
            }
        }
    }
}

async fn refresh_board_list(
    ctx: &dyn AppContext,
    client: &BoardClient,
    event_tx: &Sender<AppEvent>,
    boards: &mut Vec<crate::model::BoardSummary>,
) {
    match client.get_boards().await {
        Ok(list) => {
            if let Err(e) = Cache::save_board_list(ctx, &list) {
                log::warn!("board list cache write failed: {e}");
            }
            *boards = list.clone();
            let _ = event_tx.send(AppEvent::BoardsLoaded(list)).await;
        }
        Err(e) => {
            let _ = event_tx.send(AppEvent::Error(e.to_string())).await;
        }
    }
}
