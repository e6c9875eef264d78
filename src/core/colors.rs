//! Fixed colour lookup for the colour tags of a line template

use super::log_level::LogLevel;
use colored::Color;

/// Tags that select a colour or text style. `lc` is the level colour.
pub const COLOR_TAGS: [&str; 13] = [
    "nc", "bold", "italic", "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
    "gray", "lc",
];

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const ITALIC: &str = "\x1b[3m";

fn fg(color: Color) -> String {
    format!("\x1b[{}m", color.to_fg_str())
}

pub fn is_color_tag(name: &str) -> bool {
    COLOR_TAGS.contains(&name)
}

/// Escape sequence for a colour tag, `None` for anything else.
pub fn color_code(name: &str, level: LogLevel) -> Option<String> {
    let code = match name {
        "nc" => RESET.to_string(),
        "bold" => BOLD.to_string(),
        "italic" => ITALIC.to_string(),
        "black" => fg(Color::Black),
        "red" => fg(Color::Red),
        "green" => fg(Color::Green),
        "yellow" => fg(Color::Yellow),
        "blue" => fg(Color::Blue),
        "magenta" => fg(Color::Magenta),
        "cyan" => fg(Color::Cyan),
        "white" => fg(Color::White),
        "gray" => gray(),
        "lc" => level_color(level),
        _ => return None,
    };
    Some(code)
}

// Bold black renders as dark gray on most terminals.
fn gray() -> String {
    fg(Color::Black) + BOLD
}

/// Colour substituted for `{lc}`.
pub fn level_color(level: LogLevel) -> String {
    match level {
        LogLevel::Trace | LogLevel::Debug => gray(),
        LogLevel::Info => {
            if cfg!(windows) {
                fg(Color::Cyan) + BOLD
            } else {
                fg(Color::Blue) + BOLD
            }
        }
        LogLevel::Warning => fg(Color::Yellow) + BOLD,
        LogLevel::Error | LogLevel::Fatal => fg(Color::Red) + BOLD,
    }
}
