// File: src/tui/mod.rs
// Entry point and main loop for the TUI application.
pub mod action;
pub mod handlers;
pub mod network;
pub mod state;
pub mod view;

use crate::client::BoardClient;
use crate::config::Config;
use crate::context::SharedContext;
use crate::tui::action::Action;
use crate::tui::state::{AppState, Screen};
use crate::tui::view::draw;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, MouseEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rpassword::prompt_password;
use std::{
    io::{self, Write},
    time::Duration,
};
use tokio::sync::mpsc;

pub async fn run(ctx: SharedContext, board_override: Option<String>) -> Result<()> {
    // Panic Hook
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        use std::io::Write;
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("tablo_panic.log")
        {
            let _ = writeln!(file, "PANIC: {:?}", info);
        }
        default_hook(info);
    }));

    // --- 1. CONFIG / ONBOARDING ---
    let cfg = match Config::load(ctx.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            // If the error is NOT a missing config file, it's a syntax/permission
            // error. Report it and exit instead of treating it as a fresh install.
            if !Config::is_missing_config_error(&e) {
                eprintln!("Error loading configuration:\n{}", e);
                std::process::exit(1);
            }

            // Interactive Onboarding
            println!("Welcome to Tablo (TUI). No configuration file found.");
            println!("Let's connect to your board server.\n");

            println!("Select mode:");
            println!("  [1] Connect to a board server");
            println!("  [2] Offline Mode (cached boards only)");

            print!("\nChoice [1]: ");
            io::stdout().flush()?;

            let mut choice = String::new();
            io::stdin().read_line(&mut choice)?;

            let mut new_config = Config::default();

            if choice.trim() == "2" {
                println!("Setting up Offline Mode...");
                // Config defaults are already suitable for offline (empty url/creds)
            } else {
                loop {
                    println!("\n--- Server Connection Setup ---");

                    print!("Server URL (e.g. https://kanban.example.com/api): ");
                    io::stdout().flush()?;
                    let mut url = String::new();
                    io::stdin().read_line(&mut url)?;
                    new_config.url = url.trim().to_string();

                    print!("Username: ");
                    io::stdout().flush()?;
                    let mut user = String::new();
                    io::stdin().read_line(&mut user)?;
                    new_config.username = user.trim().to_string();

                    let pass = prompt_password("Password: ")?;
                    new_config.password = pass;

                    print!("Access token (optional, overrides password auth): ");
                    io::stdout().flush()?;
                    let mut token = String::new();
                    io::stdin().read_line(&mut token)?;
                    let token = token.trim();
                    new_config.token = if token.is_empty() {
                        None
                    } else {
                        Some(token.to_string())
                    };

                    print!("Allow insecure SSL certificates? (y/N): ");
                    io::stdout().flush()?;
                    let mut insecure = String::new();
                    io::stdin().read_line(&mut insecure)?;
                    new_config.allow_insecure_certs = insecure.trim().eq_ignore_ascii_case("y");

                    println!("\nTesting connection...");

                    let check_result = async {
                        let client = BoardClient::new(
                            &new_config.url,
                            &new_config.username,
                            &new_config.password,
                            new_config.token.as_deref(),
                            new_config.allow_insecure_certs,
                        )?;
                        client
                            .get_boards()
                            .await
                            .map(|boards| boards.len())
                            .map_err(|e| e.to_string())
                    }
                    .await;

                    match check_result {
                        Ok(count) => {
                            println!("Success! Found {} boards.", count);
                            break;
                        }
                        Err(e) => {
                            eprintln!("Connection failed: {}", e);
                            println!("Retry configuration? [Y/n]");
                            let mut retry = String::new();
                            io::stdin().read_line(&mut retry)?;
                            if retry.trim().eq_ignore_ascii_case("n") {
                                println!(
                                    "Falling back to offline mode (saving provided details anyway)."
                                );
                                break;
                            }
                        }
                    }
                }
            }

            if let Err(e) = new_config.save(ctx.as_ref()) {
                eprintln!("Warning: Could not save config file: {}", e);
            } else if let Ok(path) = Config::get_path_string(ctx.as_ref()) {
                println!("Configuration saved to: {}", path);
            }

            println!("Starting TUI...");
            std::thread::sleep(Duration::from_secs(1));
            new_config
        }
    };

    let show_card_meta = cfg.show_card_meta;
    let column_width = cfg.column_width;
    let default_board = board_override.or_else(|| cfg.default_board.clone());

    // --- 2. TERMINAL SETUP ---
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // --- 3. STATE INIT ---
    let mut app_state = AppState::new(ctx.clone());
    app_state.show_card_meta = show_card_meta;
    app_state.column_width = column_width;

    let (action_tx, action_rx) = mpsc::channel(10);
    let (event_tx, mut event_rx) = mpsc::channel(10);

    // --- 4. NETWORK ACTOR ---
    tokio::spawn(network::run_network_actor(
        ctx.clone(),
        cfg,
        default_board,
        action_rx,
        event_tx,
    ));

    // --- 5. UI LOOP ---
    loop {
        // The rendered board is a snapshot; optimistic moves show up on
        // the next frame without waiting for the server round trip.
        app_state.sync_snapshot();
        terminal.draw(|f| draw(f, &mut app_state))?;

        // A. Network Events
        if let Ok(event) = event_rx.try_recv() {
            handlers::handle_app_event(&mut app_state, event);
        }

        // B. Input Events
        if crossterm::event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollDown => match app_state.screen {
                        Screen::BoardList => app_state.next_board(),
                        Screen::Board => app_state.next_card(),
                    },
                    MouseEventKind::ScrollUp => match app_state.screen {
                        Screen::BoardList => app_state.previous_board(),
                        Screen::Board => app_state.previous_card(),
                    },
                    _ => {}
                },
                Event::Key(key) => {
                    // Filter out KeyRelease events to prevent double input on Windows
                    if key.kind == event::KeyEventKind::Release {
                        continue;
                    }

                    if let Some(action) = handlers::handle_key_event(key, &mut app_state) {
                        if matches!(action, Action::Quit) {
                            break;
                        }
                        let _ = action_tx.send(action).await;
                    }
                }
                _ => {}
            }
        }
    }

    // --- 6. CLEANUP ---
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
