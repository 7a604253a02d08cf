use std::io::{self, IsTerminal, Write};

use nu_ansi_term::{Color, Style};

use crate::InterpreterError;

/// Print a diagnostic line on stdout.
pub fn write_line(text: &str) {
    println!("{text}");
    let _ = io::stdout().flush();
}

/// Print an error line on stderr, with a red `error:` header when stderr is a TTY.
pub fn write_error(program: &str, text: &str) {
    eprintln!("{program}: {} {text}", error_header());
    let _ = io::stderr().flush();
}

fn error_header() -> String {
    // Keep pipelines free of escape codes.
    if io::stderr().is_terminal() {
        Style::new().fg(Color::Red).bold().paint("error:").to_string()
    } else {
        "error:".to_string()
    }
}

/// Report an evaluation failure, pointing at the offending character when
/// the error knows where it happened.
pub fn print_interpreter_error(program: &str, code: &str, err: &InterpreterError) {
    write_error(program, &err.to_string());
    if let Some(pos) = err.position() {
        print_error_context(code, pos);
    }
}

/// Print a caret context window around `pos`, working with UTF-8 by slicing
/// using char indices.
pub fn print_error_context(code: &str, pos: usize) {
    for line in error_context(code, pos) {
        eprintln!("  {line}");
    }
    let _ = io::stderr().flush();
}

/// The source window and caret line shown under an error.
fn error_context(code: &str, pos: usize) -> [String; 2] {
    const WINDOW_CHARS: usize = 32;

    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    // Line breaks and tabs inside the window would misplace the caret.
    let slice: String = code
        .chars()
        .skip(start_char)
        .take(end_char.saturating_sub(start_char))
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    let caret = format!("{}^", " ".repeat(pos.saturating_sub(start_char)));
    [slice, caret]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_points_at_position() {
        let [window, caret] = error_context("+a+", 1);
        assert_eq!(window, "+a+");
        assert_eq!(caret, " ^");
    }

    #[test]
    fn context_is_windowed_for_long_sources() {
        let code = format!("{}@{}", "+".repeat(100), "-".repeat(100));
        let [window, caret] = error_context(&code, 100);
        assert_eq!(window.chars().count(), 65);
        assert_eq!(window.chars().nth(32), Some('@'));
        assert_eq!(caret.len(), 33);
    }

    #[test]
    fn context_flattens_whitespace() {
        let [window, caret] = error_context("+\n\t@", 3);
        assert_eq!(window, "+  @");
        assert_eq!(caret, "   ^");
    }

    #[test]
    fn context_counts_chars_not_bytes() {
        let [window, caret] = error_context("\u{e9}\u{e9}@", 2);
        assert_eq!(window, "\u{e9}\u{e9}@");
        assert_eq!(caret, "  ^");
    }
}
