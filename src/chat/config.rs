//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures holding the current control values. A fresh
//! [`ModelConfig`] is derived from them for every request.

use std::env;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::chat::controller::DEFAULT_PACING;
use crate::error::Result;
use crate::types::{
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P, ModelConfig,
    ModelId, check_max_output_tokens, check_temperature, check_top_k, check_top_p,
};

/// Environment variable that turns on the debug panel when set to `True`.
pub const DEBUG_ENV: &str = "DEBUG_MODE";

/// Returns true if the debug flag is set in the environment.
pub fn debug_from_env() -> bool {
    debug_flag(env::var(DEBUG_ENV).ok().as_deref())
}

/// Only the exact value `True` enables debug mode.
pub fn debug_flag(value: Option<&str>) -> bool {
    value == Some("True")
}

/// Command-line arguments for the gemini-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model id, name or number (default: gemini-1.5-flash-latest)", "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Temperature 0.0-1.0 (default: 0.7)", "TEMP")]
    pub temperature: Option<f32>,

    /// Top-k sampling limit.
    #[arrrg(optional, "Top-k 1-100 (default: 40)", "K")]
    pub top_k: Option<u32>,

    /// Top-p nucleus sampling value.
    #[arrrg(optional, "Top-p 0.0-1.0 (default: 0.9)", "P")]
    pub top_p: Option<f32>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response 100-32000 (default: 4096)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Delay between rendered fragments.
    #[arrrg(optional, "Milliseconds between rendered fragments (default: 20)", "MS")]
    pub pacing_ms: Option<u64>,

    /// Whole-request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: 300)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Alternative API endpoint.
    #[arrrg(optional, "API base URL", "URL")]
    pub base_url: Option<String>,

    /// Show the debug panel and log API traffic to stderr.
    #[arrrg(flag, "Show debug info and log API traffic to stderr")]
    pub debug: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

// `CommandLine` requires `Eq`. Non-finite floats never survive `TryFrom`.
impl Eq for ChatArgs {}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: ModelId,

    /// Sampling temperature.
    pub temperature: f32,

    /// Top-k sampling limit.
    pub top_k: u32,

    /// Top-p nucleus sampling value.
    pub top_p: f32,

    /// Maximum tokens per response.
    pub max_output_tokens: u32,

    /// Delay between rendered fragments.
    pub pacing: Duration,

    /// Whole-request timeout; `None` uses the client default.
    pub timeout: Option<Duration>,

    /// Alternative API endpoint.
    pub base_url: Option<String>,

    /// Whether to show the debug panel.
    pub debug: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-1.5-flash-latest
    /// - Temperature 0.7, top-k 40, top-p 0.9
    /// - Max tokens: 4096
    /// - Pacing: 20ms
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: ModelId::default(),
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            top_p: DEFAULT_TOP_P,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            pacing: DEFAULT_PACING,
            timeout: None,
            base_url: None,
            debug: false,
            use_color: true,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = model;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the top-k value.
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the top-p value.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Sets the delay between rendered fragments.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Enables or disables the debug panel.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// The parameters for the next request.
    pub fn model_config(&self) -> Result<ModelConfig> {
        ModelConfig::new(
            self.model,
            self.temperature,
            self.top_k,
            self.top_p,
            self.max_output_tokens,
        )
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = crate::Error;

    fn try_from(args: ChatArgs) -> Result<Self> {
        let defaults = ChatConfig::new();
        let model = match args.model {
            Some(model) => model.parse()?,
            None => defaults.model,
        };
        let config = ChatConfig {
            model,
            temperature: check_temperature(args.temperature.unwrap_or(defaults.temperature))?,
            top_k: check_top_k(args.top_k.unwrap_or(defaults.top_k))?,
            top_p: check_top_p(args.top_p.unwrap_or(defaults.top_p))?,
            max_output_tokens: check_max_output_tokens(
                args.max_tokens.unwrap_or(defaults.max_output_tokens),
            )?,
            pacing: args
                .pacing_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.pacing),
            timeout: args.timeout_secs.map(Duration::from_secs),
            base_url: args.base_url,
            debug: args.debug || debug_from_env(),
            use_color: !args.no_color,
        };
        Ok(config)
    }
}
