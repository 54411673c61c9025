use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Stylize};
use std::io::{self, Write};

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    clap::builder::Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Color Palette
// ═══════════════════════════════════════════════════════════════════════════════

pub mod colors {
    use crossterm::style::Color;

    pub const CYAN: Color = Color::Rgb {
        r: 139,
        g: 233,
        b: 253,
    };
    pub const GREEN: Color = Color::Rgb {
        r: 80,
        g: 250,
        b: 123,
    };
    pub const RED: Color = Color::Rgb {
        r: 255,
        g: 85,
        b: 85,
    };
    pub const ORANGE: Color = Color::Rgb {
        r: 255,
        g: 184,
        b: 108,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
    pub const WHITE: Color = Color::Rgb {
        r: 248,
        g: 248,
        b: 242,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Indicators
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_success(message: &str) {
    println!(
        " {} {}",
        "✓".with(colors::GREEN).bold(),
        message.with(colors::GREEN)
    );
}

pub fn print_error(message: &str) {
    println!(
        " {} {}",
        "✗".with(colors::RED).bold(),
        message.with(colors::RED)
    );
}

pub fn print_warning(message: &str) {
    println!(
        " {} {}",
        "⚠".with(colors::ORANGE).bold(),
        message.with(colors::ORANGE)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Key-Value Display
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        "●".with(colors::CYAN),
        format!("{}:", key).with(colors::DIM),
        value.with(colors::WHITE)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Queue Display
// ═══════════════════════════════════════════════════════════════════════════════

/// One queue line, the playing entry marked and bold.
pub fn print_queue_entry(entry: &str, is_playing: bool) {
    if is_playing {
        println!(" {} {}", "▶".with(colors::GREEN).bold(), entry.with(colors::WHITE).bold());
    } else {
        println!("   {}", entry.with(colors::WHITE));
    }
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        "○".with(colors::DIM),
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Prompt Styling
// ═══════════════════════════════════════════════════════════════════════════════

/// Shell prompt carrying the selected room and, when known, its transport
/// state: `salotto(Kitchen|Playing)> `.
pub fn prompt(room: Option<&str>, state: Option<&str>) -> String {
    let name = "salotto".with(colors::CYAN).bold();
    match (room, state) {
        (Some(room), Some(state)) => format!(
            "{}({}{}{})> ",
            name,
            room.with(colors::GREEN),
            "|".with(colors::DIM),
            state.with(colors::ORANGE)
        ),
        (Some(room), None) => format!("{}({})> ", name, room.with(colors::GREEN)),
        _ => format!("{}> ", name),
    }
}

/// `PAUSED_PLAYBACK` as the device says it, `Paused Playback` as we show it.
pub fn transport_label(raw: &str) -> String {
    raw.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ═══════════════════════════════════════════════════════════════════════════════
// Flush Output
// ═══════════════════════════════════════════════════════════════════════════════

pub fn flush() {
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_label() {
        assert_eq!(transport_label("PLAYING"), "Playing");
        assert_eq!(transport_label("PAUSED_PLAYBACK"), "Paused Playback");
        assert_eq!(transport_label("NO_MEDIA_PRESENT"), "No Media Present");
        assert_eq!(transport_label(""), "");
    }

    #[test]
    fn test_prompt_shapes() {
        let bare = prompt(None, None);
        assert!(bare.contains("salotto"));
        assert!(bare.ends_with("> "));

        let with_room = prompt(Some("Kitchen"), None);
        assert!(with_room.contains("Kitchen"));
        assert!(with_room.ends_with(")> "));

        let with_state = prompt(Some("Kitchen"), Some("Playing"));
        assert!(with_state.contains("Kitchen"));
        assert!(with_state.contains("Playing"));
    }
}
