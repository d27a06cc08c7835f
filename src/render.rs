//! Output rendering for the chat application.
//!
//! The controller pushes the whole accumulated response to the renderer on
//! every fragment (a display buffer, not a token feed), optionally with the
//! [`STREAM_CURSOR`] marker appended.  Terminal renderers work out the delta
//! themselves so they never print the same text twice.

use std::io::{self, Stdout, Write};

/// Marker appended to the display buffer while a response is still arriving.
pub const STREAM_CURSOR: &str = "▌";

/// ANSI escape code for dim text (used for the stream cursor and notices).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for the speaker label).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Erases the single-column cursor just printed.
const ERASE_CURSOR: &str = "\x08 \x08";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - In-memory recording for tests
pub trait Renderer: Send {
    /// Called once per cycle before any fragment arrives.
    fn start_response(&mut self, label: &str);

    /// Replace the display buffer with `buffer`.
    ///
    /// While streaming, `buffer` is the accumulated response followed by
    /// [`STREAM_CURSOR`].
    fn update_display(&mut self, buffer: &str);

    /// Set the display buffer to the final response text and close it.
    fn finish_response(&mut self, text: &str);

    /// Called when the user stopped generation early.
    fn print_interrupted(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Returns the part of `next` that extends what is already on screen, or
/// `None` when `next` does not start with `shown` and must be redrawn.
pub fn display_delta<'a>(shown: &str, next: &'a str) -> Option<&'a str> {
    next.strip_prefix(shown)
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer outputs text directly to stdout. The stream cursor is only
/// drawn when styling is enabled, since erasing it relies on the terminal.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    shown: String,
    cursor_visible: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            shown: String::new(),
            cursor_visible: false,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn erase_cursor(&mut self) {
        if self.cursor_visible {
            print!("{ERASE_CURSOR}");
            self.cursor_visible = false;
        }
    }

    fn draw(&mut self, text: &str) {
        match display_delta(&self.shown, text) {
            Some(delta) => print!("{delta}"),
            None => print!("\n{text}"),
        }
        self.shown.clear();
        self.shown.push_str(text);
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self, label: &str) {
        self.shown.clear();
        self.cursor_visible = false;
        if self.use_color {
            println!("{ANSI_BOLD}{label}:{ANSI_RESET}");
        } else {
            println!("{label}:");
        }
        self.flush();
    }

    fn update_display(&mut self, buffer: &str) {
        self.erase_cursor();
        match buffer.strip_suffix(STREAM_CURSOR) {
            Some(text) => {
                self.draw(text);
                if self.use_color {
                    print!("{ANSI_DIM}{STREAM_CURSOR}{ANSI_RESET}");
                    self.cursor_visible = true;
                }
            }
            None => self.draw(buffer),
        }
        self.flush();
    }

    fn finish_response(&mut self, text: &str) {
        // The final text has no cursor; a trailing `▌` belongs to the reply.
        self.erase_cursor();
        self.draw(text);
        println!();
        self.flush();
    }

    fn print_interrupted(&mut self) {
        self.erase_cursor();
        if self.use_color {
            println!("{ANSI_DIM}[stopped]{ANSI_RESET}");
        } else {
            println!("[stopped]");
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.erase_cursor();
        if self.use_color {
            eprintln!("\n{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("\nError: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.erase_cursor();
        println!("{info}");
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn delta_appends_new_text_only() {
        assert_eq!(display_delta("", "Hi"), Some("Hi"));
        assert_eq!(display_delta("Hi", "Hi there"), Some(" there"));
        assert_eq!(display_delta("Hi there", "Hi there"), Some(""));
        assert_eq!(display_delta("Hi there", "Bye"), None);
    }

    #[test]
    fn renderer_tracks_shown_text_without_cursor() {
        let mut renderer = PlainTextRenderer::with_color(false);
        renderer.start_response("Gemini 1.5 Flash");
        renderer.update_display(&format!("Hi{STREAM_CURSOR}"));
        assert_eq!(renderer.shown, "Hi");
        assert!(!renderer.cursor_visible);
        renderer.update_display(&format!("Hi there{STREAM_CURSOR}"));
        assert_eq!(renderer.shown, "Hi there");
        renderer.finish_response("Hi there!");
        assert_eq!(renderer.shown, "Hi there!");

        renderer.start_response("Gemini 1.5 Flash");
        assert!(renderer.shown.is_empty());
    }

    #[test]
    fn final_text_keeps_trailing_block_character() {
        let reply = format!("Cursor glyph: {STREAM_CURSOR}");
        let mut renderer = PlainTextRenderer::with_color(true);
        renderer.start_response("Gemini 1.5 Flash");
        renderer.update_display(&format!("{reply}{STREAM_CURSOR}"));
        assert_eq!(renderer.shown, reply);
        assert!(renderer.cursor_visible);

        renderer.finish_response(&reply);
        assert_eq!(renderer.shown, reply);
        assert!(!renderer.cursor_visible);
    }
}
