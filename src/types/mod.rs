//! Data model and wire types.

mod generate_content;
mod message;
mod model;
mod model_config;

pub use generate_content::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, Part, PromptFeedback,
    UsageMetadata,
};
pub use message::{Message, Role};
pub use model::ModelId;
pub use model_config::{
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_K, DEFAULT_TOP_P,
    GenerationConfig, MAX_OUTPUT_TOKENS_RANGE, ModelConfig, TEMPERATURE_RANGE, TOP_K_RANGE,
    TOP_P_RANGE, check_max_output_tokens, check_temperature, check_top_k, check_top_p,
};
