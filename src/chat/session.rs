//! Chat session management.
//!
//! A [`ChatSession`] owns the history, the current configuration and the
//! generation backend. Each submission runs one streaming cycle through the
//! [`StreamingController`].

use crate::backend::GenerationBackend;
use crate::chat::config::ChatConfig;
use crate::chat::controller::{CycleOutcome, StreamingController};
use crate::chat::state::{SessionState, StopHandle};
use crate::error::Result;
use crate::render::Renderer;
use crate::types::{
    ModelConfig, ModelId, check_max_output_tokens, check_temperature, check_top_k, check_top_p,
};

/// A chat session that manages conversation state and generation cycles.
///
/// The session owns the history, the current control values and the
/// backend. It is driven by a single owner; the only thing that crosses
/// threads is the [`StopHandle`].
pub struct ChatSession<B: GenerationBackend> {
    backend: B,
    config: ChatConfig,
    state: SessionState,
    controller: StreamingController,
    completed: u64,
    cancelled: u64,
    failed: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// The model used for the next request.
    pub model: ModelId,
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// The sampling temperature.
    pub temperature: f32,
    /// The top-k value.
    pub top_k: u32,
    /// The top-p value.
    pub top_p: f32,
    /// The maximum tokens per response.
    pub max_output_tokens: u32,
    /// Cycles that ran to completion.
    pub completed_cycles: u64,
    /// Cycles the user stopped early.
    pub cancelled_cycles: u64,
    /// Cycles that ended in an error.
    pub failed_cycles: u64,
}

impl<B: GenerationBackend> ChatSession<B> {
    /// Creates a new chat session with the given backend and configuration.
    pub fn new(backend: B, config: ChatConfig) -> Self {
        let controller = StreamingController::new(config.pacing);
        Self {
            backend,
            config,
            state: SessionState::new(),
            controller,
            completed: 0,
            cancelled: 0,
            failed: 0,
        }
    }

    /// Submits user input and streams the response into `renderer`.
    ///
    /// Whitespace-only input is ignored and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Busy`] if a response is already being
    /// generated, or a validation error if the current parameters are out
    /// of range. Generation errors are reported through the returned
    /// [`CycleOutcome`].
    pub async fn submit(
        &mut self,
        input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<CycleOutcome>> {
        if input.trim().is_empty() {
            return Ok(None);
        }
        let model_config = self.model_config()?;
        let outcome = self
            .controller
            .run_cycle(
                &self.backend,
                &mut self.state,
                input,
                &model_config,
                renderer,
            )
            .await?;
        match &outcome {
            Some(CycleOutcome::Completed(_)) => self.completed += 1,
            Some(CycleOutcome::Cancelled(_)) => self.cancelled += 1,
            Some(CycleOutcome::Failed(_)) => self.failed += 1,
            None => {}
        }
        Ok(outcome)
    }

    /// The parameters for the next request, built fresh from the current values.
    pub fn model_config(&self) -> Result<ModelConfig> {
        self.config.model_config()
    }

    /// Clears the conversation history.
    pub fn clear(&mut self) {
        self.state.clear();
    }

    /// A handle that stops the active response from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.state.generation().stop_handle()
    }

    /// The session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The current configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// The backend responses are generated with.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.state.message_count()
    }

    /// Returns the current model.
    pub fn model(&self) -> ModelId {
        self.config.model
    }

    /// Changes the model used for responses.
    pub fn set_model(&mut self, model: ModelId) {
        self.config.model = model;
    }

    /// Sets the sampling temperature, keeping the old value if out of range.
    pub fn set_temperature(&mut self, temperature: f32) -> Result<()> {
        self.config.temperature = check_temperature(temperature)?;
        Ok(())
    }

    /// Sets the top-k value, keeping the old value if out of range.
    pub fn set_top_k(&mut self, top_k: u32) -> Result<()> {
        self.config.top_k = check_top_k(top_k)?;
        Ok(())
    }

    /// Sets the top-p value, keeping the old value if out of range.
    pub fn set_top_p(&mut self, top_p: f32) -> Result<()> {
        self.config.top_p = check_top_p(top_p)?;
        Ok(())
    }

    /// Sets the maximum tokens per response, keeping the old value if out of range.
    pub fn set_max_output_tokens(&mut self, max_output_tokens: u32) -> Result<()> {
        self.config.max_output_tokens = check_max_output_tokens(max_output_tokens)?;
        Ok(())
    }

    /// Flips the debug panel and returns the new setting.
    pub fn toggle_debug(&mut self) -> bool {
        self.config.debug = !self.config.debug;
        self.config.debug
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.model,
            message_count: self.message_count(),
            temperature: self.config.temperature,
            top_k: self.config.top_k,
            top_p: self.config.top_p,
            max_output_tokens: self.config.max_output_tokens,
            completed_cycles: self.completed,
            cancelled_cycles: self.cancelled,
            failed_cycles: self.failed,
        }
    }
}
