//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the API.

use std::fmt::Display;
use std::str::FromStr;

use crate::types::{
    MAX_OUTPUT_TOKENS_RANGE, ModelId, TEMPERATURE_RANGE, TOP_K_RANGE, TOP_P_RANGE,
    check_max_output_tokens, check_temperature, check_top_k, check_top_p,
};

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history.
    Clear,

    /// Change the model.
    Model(ModelId),

    /// List the available models.
    Models,

    /// Set the sampling temperature.
    Temperature(f32),

    /// Set the top-k value.
    TopK(u32),

    /// Set the top-p value.
    TopP(f32),

    /// Set the maximum tokens per response.
    MaxTokens(u32),

    /// Show the current configuration.
    Config,

    /// Display session statistics (message count, current model, etc.).
    Stats,

    /// Toggle the debug panel.
    Debug,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use geminichat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model gemini-exp-1206").is_some());
/// assert!(parse_command("Hello, Gemini!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "model" => match argument {
            Some(model) => match model.parse::<ModelId>() {
                Ok(model) => ChatCommand::Model(model),
                Err(_) => ChatCommand::Invalid(format!(
                    "Unknown model: {model} (use /models to list them)"
                )),
            },
            None => ChatCommand::Invalid("/model requires a model name or number".to_string()),
        },
        "models" => ChatCommand::Models,
        "temperature" => parse_value(
            argument,
            "/temperature",
            ChatCommand::Temperature,
            check_temperature,
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end(),
        ),
        "top_k" => parse_value(
            argument,
            "/top_k",
            ChatCommand::TopK,
            check_top_k,
            TOP_K_RANGE.start(),
            TOP_K_RANGE.end(),
        ),
        "top_p" => parse_value(
            argument,
            "/top_p",
            ChatCommand::TopP,
            check_top_p,
            TOP_P_RANGE.start(),
            TOP_P_RANGE.end(),
        ),
        "max_tokens" => parse_value(
            argument,
            "/max_tokens",
            ChatCommand::MaxTokens,
            check_max_output_tokens,
            MAX_OUTPUT_TOKENS_RANGE.start(),
            MAX_OUTPUT_TOKENS_RANGE.end(),
        ),
        "config" => ChatCommand::Config,
        "stats" | "status" => ChatCommand::Stats,
        "debug" => ChatCommand::Debug,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn parse_value<T, F, C>(
    argument: Option<&str>,
    name: &str,
    constructor: F,
    check: C,
    min: &T,
    max: &T,
) -> ChatCommand
where
    T: FromStr + Display,
    F: Fn(T) -> ChatCommand,
    C: Fn(T) -> crate::Result<T>,
{
    let Some(arg) = argument else {
        return ChatCommand::Invalid(format!("{name} requires a value"));
    };
    match arg.parse::<T>().ok().map(check) {
        Some(Ok(value)) => constructor(value),
        _ => ChatCommand::Invalid(format!("{name} expects a value between {min} and {max}")),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Clear conversation history
  /model <name|n>        Change the model (e.g., /model gemini-exp-1206 or /model 2)
  /models                List the available models
  /temperature <v>       Set temperature 0.0-1.0
  /top_k <n>             Set top-k 1-100
  /top_p <v>             Set top-p 0.0-1.0
  /max_tokens <n>        Set maximum response tokens 100-32000
  /config                Show current configuration
  /stats                 Show session statistics
  /debug                 Toggle the debug panel
  /help                  Show this help message
  /quit                  Exit the chat

Press Ctrl-C while a response is streaming to stop it."#
}
