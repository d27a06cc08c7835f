//! The explicit render function for the REPL.
//!
//! Nothing here holds state of its own. [`render_view`] derives everything it
//! shows from the session state and configuration, and the REPL calls it
//! again after every event.

use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

use crate::chat::config::ChatConfig;
use crate::chat::state::SessionState;
use crate::types::ModelId;

/// Title line printed once at startup.
pub const TITLE: &str = "💬 AI Chat Interface";

/// Caption printed under the title.
pub const CAPTION: &str = "v1.3 | Sometimes gets confused";

/// Standing warning about model output.
pub const WARNING: &str = "⚠️ Warning:\n- Outputs may be inaccurate\n- Don't share sensitive info";

const GETTING_STARTED: &str = "\
Getting Started Guide

📌 Quick Tips:
- Change models for different tasks (/models, /model <n>)
- Lower temp for factual answers
- Higher temp for creative writing
- Press Ctrl-C to stop a response if stuck

🔧 Troubleshooting:
- Slow? Reduce max tokens (/max_tokens)
- Errors? Check API key (GOOGLE_API_KEY)
- Weird answers? Adjust temp (/temperature)

Type /help for all commands.";

/// Printed by the REPL before each submission.
pub const STOP_HINT: &str = "Generating... press Ctrl-C to stop.";

/// The read-only debug panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugInfo {
    /// Number of messages in the history.
    pub messages_count: usize,
    /// The model selected for the next request.
    pub current_model: ModelId,
    /// When the history last changed.
    #[serde(serialize_with = "crate::utils::time::serialize")]
    pub last_update: OffsetDateTime,
}

/// What the REPL should show for the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// Whether to show the getting-started guide.
    pub help: bool,
    /// The debug panel, when enabled.
    pub debug: Option<DebugInfo>,
}

impl View {
    /// True if there is nothing to print.
    pub fn is_empty(&self) -> bool {
        !self.help && self.debug.is_none()
    }
}

/// Derives the view from the session state and configuration.
pub fn render_view(state: &SessionState, config: &ChatConfig) -> View {
    View {
        help: state.show_help() && state.messages().is_empty(),
        debug: config.debug.then(|| DebugInfo {
            messages_count: state.message_count(),
            current_model: config.model,
            last_update: state.last_update(),
        }),
    }
}

/// The startup banner: title, caption and warning.
pub fn banner() -> String {
    format!("{TITLE}\n{CAPTION}\n\n{WARNING}")
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sections = Vec::new();
        if self.help {
            sections.push(GETTING_STARTED.to_string());
        }
        if let Some(debug) = &self.debug {
            let json = serde_json::to_string_pretty(debug).map_err(|_| fmt::Error)?;
            sections.push(format!("Debug Info:\n{json}"));
        }
        write!(f, "{}", sections.join("\n\n"))
    }
}
