//! Plain-text rendering of session views for the terminal.

use holdem_sync::{Card, ConnectionState, Notice, SessionView, Severity};
use std::fmt;

const RED: &str = "\x1B[31m";
const GREEN: &str = "\x1B[32m";
const YELLOW: &str = "\x1B[33m";
const RESET: &str = "\x1B[0m";

/// Log entries shown under the table.
const LOG_LINES: usize = 8;

/// Format a card, red for hearts and diamonds.
pub fn format_card(card: &Card) -> String {
    if card.is_red() {
        format!("{RED}{card}{RESET}")
    } else {
        card.to_string()
    }
}

fn format_cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "-".to_string();
    }
    cards.iter().map(format_card).collect::<Vec<_>>().join(" ")
}

/// Format a notice as a single colored line.
pub fn format_notice(notice: &Notice) -> String {
    let color = match notice.severity {
        Severity::Success => GREEN,
        Severity::Warning => YELLOW,
        Severity::Error => RED,
        Severity::Info => "",
    };
    if color.is_empty() {
        notice.to_string()
    } else {
        format!("{color}{notice}{RESET}")
    }
}

/// The whole table as it should appear on screen.
pub struct TableView<'a>(pub &'a SessionView);

impl fmt::Display for TableView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.0;
        let snapshot = &view.snapshot;

        // Clear screen and move cursor to top
        write!(f, "\x1B[2J\x1B[1;1H")?;

        writeln!(f, "{}", "═".repeat(80))?;
        let connection = match view.connection {
            ConnectionState::Connected => format!("{GREEN}connected{RESET}"),
            ConnectionState::Connecting => format!("{YELLOW}connecting{RESET}"),
            ConnectionState::Disconnected => format!("{RED}disconnected{RESET}"),
        };
        let auto = if view.auto_game_running { "on" } else { "off" };
        writeln!(f, "HOLD'EM TABLE  [{connection}]  auto game: {auto}")?;
        writeln!(f, "{}", "═".repeat(80))?;

        writeln!(
            f,
            "Phase: {}   Pot: ${}   Current bet: ${}   Players: {}",
            snapshot.phase, snapshot.pot, snapshot.current_bet, view.player_count
        )?;
        writeln!(f, "Board: {}", format_cards(&snapshot.community_cards))?;
        writeln!(f, "{}", "─".repeat(80))?;

        if snapshot.players.is_empty() {
            writeln!(f, "No players at table")?;
        } else {
            writeln!(f, "Players:")?;
            let acting = snapshot.acting_player_id();
            for (i, player) in snapshot.players.iter().enumerate() {
                let mut markers: Vec<&str> = player.badges();
                if acting == Some(player.id.as_str()) {
                    markers.push("→");
                }
                let markers = if markers.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", markers.join("/"))
                };
                let you = if view.identity.as_deref() == Some(player.id.as_str()) {
                    " [you]"
                } else {
                    ""
                };
                let kind = if player.is_ai { " AI" } else { "" };

                writeln!(
                    f,
                    "  {}. {}{kind}{you}{markers} - ${} - bet ${} - {}",
                    i + 1,
                    player.name,
                    player.chips,
                    player.current_bet,
                    player.status_label()
                )?;
            }
        }

        if view.identity.is_some() {
            writeln!(f, "{}", "─".repeat(80))?;
            writeln!(f, "Your cards: {}", format_cards(view.my_hole_cards()))?;
            if view.is_my_turn {
                writeln!(f, "{GREEN}>>> YOUR TURN <<<{RESET}")?;
            }
        }

        if !view.log.is_empty() {
            writeln!(f, "{}", "─".repeat(80))?;
            let skip = view.log.len().saturating_sub(LOG_LINES);
            for entry in view.log.iter().skip(skip) {
                writeln!(f, "  {entry}")?;
            }
        }

        writeln!(f, "{}", "═".repeat(80))?;
        writeln!(f, "Type 'help' for commands")
    }
}
