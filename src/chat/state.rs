//! Per-session state: conversation history and transient flags.
//!
//! [`SessionState`] is the only owner of the history. The generation flags
//! live behind an `Arc` so a Ctrl-C handler on another thread can request a
//! stop through a [`StopHandle`]; everything else is touched only by the
//! session's owner.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use time::OffsetDateTime;

use crate::types::{Message, Role};
use crate::utils::time::now;

#[derive(Debug, Default)]
struct Flags {
    generating: AtomicBool,
    stop_requested: AtomicBool,
}

/// Whether a response is being generated, and whether the user asked to stop.
///
/// `stop_requested` is only ever observed as true while `generating` is true,
/// and both are cleared when a cycle ends, whichever way it ends.
#[derive(Debug, Clone, Default)]
pub struct GenerationState {
    flags: Arc<Flags>,
}

impl GenerationState {
    /// True while a cycle is active.
    pub fn is_generating(&self) -> bool {
        self.flags.generating.load(Ordering::SeqCst)
    }

    /// True if the user asked the active cycle to stop.
    pub fn is_stop_requested(&self) -> bool {
        self.is_generating() && self.flags.stop_requested.load(Ordering::SeqCst)
    }

    /// A handle that can request a stop from anywhere.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flags: Arc::clone(&self.flags),
        }
    }

    /// Marks a cycle as started.
    ///
    /// Returns `None` if one is already running. The flags are cleared when
    /// the returned guard is dropped.
    pub(crate) fn begin(&self) -> Option<GenerationGuard> {
        self.flags
            .generating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        self.flags.stop_requested.store(false, Ordering::SeqCst);
        Some(GenerationGuard {
            flags: Arc::clone(&self.flags),
        })
    }
}

/// Requests cooperative cancellation of the active cycle.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flags: Arc<Flags>,
}

impl StopHandle {
    /// Asks the active cycle to stop at the next fragment boundary.
    ///
    /// Returns false, and does nothing, when no cycle is active.
    pub fn request_stop(&self) -> bool {
        if !self.flags.generating.load(Ordering::SeqCst) {
            return false;
        }
        self.flags.stop_requested.store(true, Ordering::SeqCst);
        true
    }
}

/// Clears both generation flags on drop.
#[derive(Debug)]
pub(crate) struct GenerationGuard {
    flags: Arc<Flags>,
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        self.flags.stop_requested.store(false, Ordering::SeqCst);
        self.flags.generating.store(false, Ordering::SeqCst);
    }
}

/// Conversation history and UI flags for one session.
#[derive(Debug)]
pub struct SessionState {
    messages: Vec<Message>,
    generation: GenerationState,
    show_help: bool,
    last_update: OffsetDateTime,
}

impl SessionState {
    /// Creates the state for a new session: no messages, help shown, idle.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            generation: GenerationState::default(),
            show_help: true,
            last_update: now(),
        }
    }

    /// The full history, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the history.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// The generation flags.
    pub fn generation(&self) -> &GenerationState {
        &self.generation
    }

    /// Whether the getting-started guide should be visible.
    pub fn show_help(&self) -> bool {
        self.show_help
    }

    /// When the history last changed.
    pub fn last_update(&self) -> OffsetDateTime {
        self.last_update
    }

    /// Appends a message to the end of the history.
    ///
    /// A user message also hides the getting-started guide.
    pub fn append_message(&mut self, message: Message) {
        if message.role() == Role::User {
            self.show_help = false;
        }
        self.messages.push(message);
        self.last_update = now();
    }

    /// Empties the history and shows the getting-started guide again.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.show_help = true;
        self.last_update = now();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
