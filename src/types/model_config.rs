use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::ModelId;

/// Allowed sampling temperature.
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Allowed top-k.
pub const TOP_K_RANGE: RangeInclusive<u32> = 1..=100;
/// Allowed top-p.
pub const TOP_P_RANGE: RangeInclusive<f32> = 0.0..=1.0;
/// Allowed response length, in tokens.
pub const MAX_OUTPUT_TOKENS_RANGE: RangeInclusive<u32> = 100..=32_000;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default top-k.
pub const DEFAULT_TOP_K: u32 = 40;
/// Default top-p.
pub const DEFAULT_TOP_P: f32 = 0.9;
/// Default response length, in tokens.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;

/// The model and sampling parameters for one request.
///
/// A `ModelConfig` is built fresh from the current control values for every
/// submission and never outlives the cycle that uses it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelConfig {
    model: ModelId,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl ModelConfig {
    /// Creates a configuration, rejecting out-of-range parameters.
    pub fn new(
        model: ModelId,
        temperature: f32,
        top_k: u32,
        top_p: f32,
        max_output_tokens: u32,
    ) -> Result<Self> {
        Ok(Self {
            model,
            temperature: check_temperature(temperature)?,
            top_k: check_top_k(top_k)?,
            top_p: check_top_p(top_p)?,
            max_output_tokens: check_max_output_tokens(max_output_tokens)?,
        })
    }

    /// The model to call.
    pub fn model(&self) -> ModelId {
        self.model
    }

    /// Sampling temperature in `[0, 1]`.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Top-k in `[1, 100]`.
    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    /// Top-p in `[0, 1]`.
    pub fn top_p(&self) -> f32 {
        self.top_p
    }

    /// Response length limit in `[100, 32000]`.
    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    /// The `generationConfig` object sent with the request.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: Some(self.temperature),
            top_k: Some(self.top_k),
            top_p: Some(self.top_p),
            max_output_tokens: Some(self.max_output_tokens),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: ModelId::default(),
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            top_p: DEFAULT_TOP_P,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Wire form of the sampling parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-k.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Top-p.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Maximum tokens in the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Validates a temperature value.
pub fn check_temperature(value: f32) -> Result<f32> {
    check_float(value, TEMPERATURE_RANGE, "temperature")
}

/// Validates a top-k value.
pub fn check_top_k(value: u32) -> Result<u32> {
    check_int(value, TOP_K_RANGE, "top_k")
}

/// Validates a top-p value.
pub fn check_top_p(value: f32) -> Result<f32> {
    check_float(value, TOP_P_RANGE, "top_p")
}

/// Validates a max-output-tokens value.
pub fn check_max_output_tokens(value: u32) -> Result<u32> {
    check_int(value, MAX_OUTPUT_TOKENS_RANGE, "max_output_tokens")
}

fn check_float(value: f32, range: RangeInclusive<f32>, param: &str) -> Result<f32> {
    if value.is_finite() && range.contains(&value) {
        Ok(value)
    } else {
        Err(Error::validation(
            format!(
                "{param} must be between {} and {}, got {value}",
                range.start(),
                range.end()
            ),
            Some(param.to_string()),
        ))
    }
}

fn check_int(value: u32, range: RangeInclusive<u32>, param: &str) -> Result<u32> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(Error::validation(
            format!(
                "{param} must be between {} and {}, got {value}",
                range.start(),
                range.end()
            ),
            Some(param.to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_controls() {
        let config = ModelConfig::default();
        assert_eq!(config.model(), ModelId::Gemini15FlashLatest);
        assert_eq!(config.temperature(), 0.7);
        assert_eq!(config.top_k(), 40);
        assert_eq!(config.top_p(), 0.9);
        assert_eq!(config.max_output_tokens(), 4096);
    }

    #[test]
    fn range_edges_are_accepted() {
        assert!(ModelConfig::new(ModelId::GeminiExp1206, 0.0, 1, 0.0, 100).is_ok());
        assert!(ModelConfig::new(ModelId::GeminiExp1206, 1.0, 100, 1.0, 32_000).is_ok());
    }

    #[test]
    fn out_of_range_is_rejected() {
        let model = ModelId::default();
        let err = ModelConfig::new(model, 1.5, 40, 0.9, 4096).unwrap_err();
        assert!(matches!(err, Error::Validation { param: Some(ref p), .. } if p == "temperature"));
        assert!(ModelConfig::new(model, f32::NAN, 40, 0.9, 4096).is_err());
        assert!(ModelConfig::new(model, 0.7, 0, 0.9, 4096).is_err());
        assert!(ModelConfig::new(model, 0.7, 101, 0.9, 4096).is_err());
        assert!(ModelConfig::new(model, 0.7, 40, -0.1, 4096).is_err());
        assert!(ModelConfig::new(model, 0.7, 40, 0.9, 99).is_err());
        assert!(ModelConfig::new(model, 0.7, 40, 0.9, 32_001).is_err());
    }

    #[test]
    fn generation_config_wire_format() {
        let config = ModelConfig::new(ModelId::default(), 0.5, 10, 0.25, 2048).unwrap();
        let json = serde_json::to_value(config.generation_config()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "temperature": 0.5,
                "topK": 10,
                "topP": 0.25,
                "maxOutputTokens": 2048,
            })
        );
        let empty = serde_json::to_string(&GenerationConfig::default()).unwrap();
        assert_eq!(empty, "{}");
    }
}
