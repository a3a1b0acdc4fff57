// File: ./src/system.rs
//! Desktop integration: OS notifications for events the user should see
//! even when the terminal is not focused.
use notify_rust::Notification;

/// Fires an OS notification for a card move the server refused. The local
/// board has already been rolled back when this is called; the
/// notification is the dismissible record of what happened.
///
/// Spawned on a plain thread because notification daemons can block.
pub fn notify_move_failed(card_title: &str, reason: &str) {
    let summary = format!("Move failed: {}", card_title);
    let body = reason.to_string();
    std::thread::spawn(move || {
        let _ = Notification::new()
            .summary(&summary)
            .body(&body)
            .appname("Tablo")
            .show();
    });
}
