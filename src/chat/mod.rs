//! Chat application module for interactive conversations with Gemini.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! geminichat client library. It supports:
//!
//! - Streaming responses with a live cursor and Ctrl-C to stop
//! - Slash commands for session control
//! - Configurable model and sampling parameters
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`state`]: Conversation history and generation flags
//! - [`controller`]: One request/response cycle at a time
//! - [`session`]: Ties state, configuration and backend together
//! - [`view`]: Derives what to show from state
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: Slash command parsing

pub mod commands;
pub mod config;
pub mod controller;
pub mod session;
pub mod state;
pub mod view;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, debug_from_env};
pub use controller::{CycleOutcome, DEFAULT_PACING, StreamingController};
pub use session::{ChatSession, SessionStats};
pub use state::{GenerationState, SessionState, StopHandle};
pub use view::{DebugInfo, View, banner, render_view};
