// File: src/tui/view.rs
use crate::model::{Card, Priority};
use crate::tui::state::{AppState, InputMode, Screen};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let full_help_text = help_lines(state.screen);

    let footer_height = if state.show_full_help {
        Constraint::Length(full_help_text.len() as u16 + 2)
    } else {
        Constraint::Length(3)
    };

    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), footer_height])
        .split(f.area());

    match state.screen {
        Screen::BoardList => draw_board_list(f, state, v_chunks[0]),
        Screen::Board => draw_board(f, state, v_chunks[0]),
    }

    draw_footer(f, state, &full_help_text, v_chunks[1]);

    if state.show_card_popup {
        draw_card_popup(f, state);
    }
}

fn draw_board_list(f: &mut Frame, state: &mut AppState, area: Rect) {
    if state.boards.is_empty() && !state.loading {
        let msg = Paragraph::new("No boards yet. Press 'a' to create one, 'r' to refresh.")
            .block(Block::default().borders(Borders::ALL).title(" Boards "));
        f.render_widget(msg, area);
        return;
    }

    let title = if state.loading {
        " Boards (Loading...) ".to_string()
    } else {
        format!(" Boards ({}) ", state.boards.len())
    };

    let items: Vec<ListItem> = state
        .boards
        .iter()
        .map(|b| {
            let mut spans = vec![Span::raw(b.name.clone())];
            if !b.description.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", truncate_to_width(&b.description, 48)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if let Some(members) = b.members {
                spans.push(Span::styled(
                    format!(" ({} members)", members),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if let Some(modified) = &b.last_modified {
                spans.push(Span::styled(
                    format!(" @{}", modified.format("%Y-%m-%d")),
                    Style::default().fg(Color::Blue),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::Green)
                .fg(Color::Black),
        );
    f.render_stateful_widget(list, area, &mut state.board_list_state);
}

fn draw_board(f: &mut Frame, state: &AppState, area: Rect) {
    let Some(board) = &state.board else {
        let msg = Paragraph::new("Loading board...")
            .block(Block::default().borders(Borders::ALL).title(" Board "));
        f.render_widget(msg, area);
        return;
    };

    if board.columns.is_empty() {
        let msg = Paragraph::new("No columns yet. Press 'c' to add one, Esc to go back.").block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", board.name)),
        );
        f.render_widget(msg, area);
        return;
    }

    let col_width = state.column_width.max(10);
    let visible = (area.width / col_width).max(1) as usize;

    // Keep the focused column on screen; once the cursor walks past the
    // right edge the window slides with it.
    let first = state
        .column_cursor
        .saturating_sub(visible.saturating_sub(1));
    let last = (first + visible).min(board.columns.len());
    let shown = &board.columns[first..last];

    let constraints: Vec<Constraint> = shown.iter().map(|_| Constraint::Length(col_width)).collect();
    let col_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    let inner_width = col_width.saturating_sub(2) as usize;

    for (i, column) in shown.iter().enumerate() {
        let is_focused = first + i == state.column_cursor;

        let mut header = vec![
            Span::styled(
                format!(" {} ", column.name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("({})", column.cards.len()),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if let Some(limit) = column.wip_limit {
            let color = if column.over_wip_limit() {
                Color::Red
            } else {
                Color::DarkGray
            };
            header.push(Span::styled(
                format!(" [{}/{}]", column.cards.len(), limit),
                Style::default().fg(color),
            ));
        }

        let border_style = if is_focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let items: Vec<ListItem> = column
            .cards
            .iter()
            .map(|card| card_row(card, inner_width, state.show_card_meta))
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Line::from(header))
                    .border_style(border_style),
            )
            .highlight_style(
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .bg(Color::Green)
                    .fg(Color::Black),
            );

        if is_focused && !column.cards.is_empty() {
            let mut ls = ListState::default();
            ls.select(Some(state.card_cursor.min(column.cards.len() - 1)));
            f.render_stateful_widget(list, col_areas[i], &mut ls);
        } else {
            f.render_widget(list, col_areas[i]);
        }
    }
}

fn card_row(card: &Card, width: usize, show_meta: bool) -> ListItem<'static> {
    let mut prefix: Vec<Span> = Vec::new();
    let mut suffix: Vec<Span> = Vec::new();

    if show_meta {
        if let Some(p) = card.priority {
            let color = match p {
                Priority::High => Color::Red,
                Priority::Medium => Color::Yellow,
                Priority::Low => Color::DarkGray,
            };
            prefix.push(Span::styled("! ", Style::default().fg(color)));
        }
        if card.status.map(|s| s.is_done()).unwrap_or(false) {
            prefix.push(Span::styled("✓ ", Style::default().fg(Color::Green)));
        }
        if let Some(due) = &card.due_date {
            suffix.push(Span::styled(
                format!(" @{}", due.format("%m-%d")),
                Style::default().fg(Color::Blue),
            ));
        }
        if !card.description.is_empty() {
            suffix.push(Span::styled(" ≡", Style::default().fg(Color::DarkGray)));
        }
    }

    let used: usize = prefix.iter().map(|s| s.width()).sum::<usize>()
        + suffix.iter().map(|s| s.width()).sum::<usize>();
    let title = truncate_to_width(&card.title, width.saturating_sub(used));

    let mut spans = prefix;
    spans.push(Span::raw(title));
    spans.extend(suffix);
    ListItem::new(Line::from(spans))
}

/// Cuts `text` to at most `max` display columns, appending an ellipsis
/// when anything was dropped. Wide glyphs count as two columns.
fn truncate_to_width(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= max {
        return text.to_string();
    }
    let budget = max.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn draw_footer(f: &mut Frame, state: &AppState, help_text: &[Line<'static>], area: Rect) {
    f.render_widget(Clear, area);

    match state.mode {
        InputMode::Normal => {
            if state.show_full_help {
                let p = Paragraph::new(help_text.to_vec())
                    .block(Block::default().borders(Borders::ALL).title(" Help "))
                    .wrap(Wrap { trim: false });
                f.render_widget(p, area);
                return;
            }

            let status_title = if state.syncing {
                " Status [syncing] "
            } else {
                " Status "
            };
            let (status_text, status_style) = if let Some(err) = &state.last_error {
                (
                    format!("Error: {} (Esc to dismiss)", err),
                    Style::default().fg(Color::Red),
                )
            } else {
                (state.message.clone(), Style::default().fg(Color::Cyan))
            };
            let status = Paragraph::new(status_text).style(status_style).block(
                Block::default()
                    .borders(Borders::LEFT | Borders::TOP | Borders::BOTTOM)
                    .title(status_title),
            );

            let help_str = match state.screen {
                Screen::BoardList => "?:Help q:Quit ↵:Open a:Add e:Rename D:Delete r:Refresh",
                Screen::Board => "?:Help ↵:View a:Card c:Column J/K/H/L:Move d:Del Esc:Back",
            };
            let help = Paragraph::new(help_str).alignment(Alignment::Right).block(
                Block::default()
                    .borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)
                    .title(" Actions "),
            );

            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(area);
            f.render_widget(status, chunks[0]);
            f.render_widget(help, chunks[1]);
        }
        _ => {
            let (title, prefix, color) = match state.mode {
                InputMode::CreatingBoard => (" New Board ", "> ", Color::Yellow),
                InputMode::RenamingBoard => (" Rename Board ", "> ", Color::Magenta),
                InputMode::CreatingColumn => (" New Column ", "> ", Color::Yellow),
                InputMode::RenamingColumn => (" Rename Column ", "> ", Color::Magenta),
                InputMode::CreatingCard => (" New Card ", "> ", Color::Yellow),
                InputMode::EditingCardTitle => (" Edit Title ", "> ", Color::Magenta),
                InputMode::EditingCardDescription => (" Edit Description ", "> ", Color::Blue),
                InputMode::Normal => ("", "", Color::Reset),
            };

            let input_text = Line::from(vec![
                Span::styled(prefix, Style::default().fg(color)),
                Span::raw(state.input_buffer.clone()),
            ]);
            let input = Paragraph::new(input_text)
                .block(Block::default().borders(Borders::ALL).title(title))
                .wrap(Wrap { trim: false });
            f.render_widget(input, area);

            // Cursor rendering
            let cursor_x =
                area.x + 1 + prefix.chars().count() as u16 + state.cursor_position as u16;
            f.set_cursor_position((
                cursor_x.min(area.x + area.width.saturating_sub(2)),
                area.y + 1,
            ));
        }
    }
}

fn draw_card_popup(f: &mut Frame, state: &AppState) {
    let Some(card) = state.selected_card() else {
        return;
    };
    let area = centered_rect(60, 60, f.area());

    let mut meta: Vec<Line> = Vec::new();
    if let Some(p) = card.priority {
        meta.push(Line::from(vec![
            Span::styled("Priority: ", Style::default().fg(Color::DarkGray)),
            Span::raw(p.label()),
        ]));
    }
    if let Some(s) = card.status {
        meta.push(Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
            Span::raw(s.label()),
        ]));
    }
    if let Some(due) = &card.due_date {
        meta.push(Line::from(vec![
            Span::styled("Due: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                due.format("%Y-%m-%d %H:%M").to_string(),
                Style::default().fg(Color::Blue),
            ),
        ]));
    }
    if !card.assignees.is_empty() {
        let names: Vec<&str> = card.assignees.iter().map(|u| u.name.as_str()).collect();
        meta.push(Line::from(vec![
            Span::styled("Assignees: ", Style::default().fg(Color::DarkGray)),
            Span::raw(names.join(", ")),
        ]));
    }
    if !meta.is_empty() {
        meta.push(Line::from(""));
    }

    let mut text = Text::from(meta);
    if card.description.is_empty() {
        text.push_line(Line::from(Span::styled(
            "(no description)",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        text.extend(tui_markdown::from_str(&card.description));
    }
    text.push_line(Line::from(""));
    text.push_line(Line::from(Span::styled(
        "Esc:Close  e:Edit Title  E:Edit Description",
        Style::default().fg(Color::DarkGray),
    )));

    let popup = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", card.title)),
        );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn help_lines(screen: Screen) -> Vec<Line<'static>> {
    match screen {
        Screen::BoardList => vec![
            Line::from(vec![
                Span::styled(
                    " GLOBAL ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" ?:Toggle Help  q:Quit  Esc:Dismiss Error"),
            ]),
            Line::from(vec![
                Span::styled(
                    " NAVIGATION ",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" j/k:Up/Down  Enter/l:Open Board"),
            ]),
            Line::from(vec![
                Span::styled(
                    " BOARDS ",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" a:Add  e:Rename  D:Delete  r:Refresh"),
            ]),
        ],
        Screen::Board => vec![
            Line::from(vec![
                Span::styled(
                    " GLOBAL ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" ?:Toggle Help  q:Quit  Esc:Back  r:Refresh  m:Card Meta"),
            ]),
            Line::from(vec![
                Span::styled(
                    " NAVIGATION ",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" h/l:Column  j/k:Card  Enter/v:View Card"),
            ]),
            Line::from(vec![
                Span::styled(
                    " MOVE ",
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" J/K:Within Column  H/L:Across Columns"),
            ]),
            Line::from(vec![
                Span::styled(
                    " CARDS ",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" a:Add  e:Edit Title  E:Edit Desc  d:Delete  Space:Status  +/-:Priority"),
            ]),
            Line::from(vec![
                Span::styled(
                    " COLUMNS ",
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" c:Add  R:Rename  D:Delete  </>:Shift Left/Right"),
            ]),
        ],
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
