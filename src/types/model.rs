use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A Gemini model the chat can talk to.
///
/// Serializes to the API model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    /// Gemini 1.5 Flash (latest).
    #[serde(rename = "gemini-1.5-flash-latest")]
    Gemini15FlashLatest,

    /// Gemini 2.0 Flash, experimental.
    #[serde(rename = "gemini-2.0-flash-exp")]
    Gemini20FlashExp,

    /// Gemini 2.0 Flash Thinking, experimental 2024-12-19.
    #[serde(rename = "gemini-2.0-flash-thinking-exp-1219")]
    Gemini20FlashThinkingExp1219,

    /// Gemini experimental 2024-12-06.
    #[serde(rename = "gemini-exp-1206")]
    GeminiExp1206,

    /// LearnLM 1.5 Pro, experimental.
    #[serde(rename = "learnlm-1.5-pro-experimental")]
    LearnLm15ProExperimental,
}

impl ModelId {
    /// Every supported model, in menu order.
    pub const ALL: [ModelId; 5] = [
        ModelId::Gemini15FlashLatest,
        ModelId::Gemini20FlashExp,
        ModelId::Gemini20FlashThinkingExp1219,
        ModelId::GeminiExp1206,
        ModelId::LearnLm15ProExperimental,
    ];

    /// The identifier used in API paths.
    pub fn api_id(self) -> &'static str {
        match self {
            ModelId::Gemini15FlashLatest => "gemini-1.5-flash-latest",
            ModelId::Gemini20FlashExp => "gemini-2.0-flash-exp",
            ModelId::Gemini20FlashThinkingExp1219 => "gemini-2.0-flash-thinking-exp-1219",
            ModelId::GeminiExp1206 => "gemini-exp-1206",
            ModelId::LearnLm15ProExperimental => "learnlm-1.5-pro-experimental",
        }
    }

    /// Human-friendly name for menus.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelId::Gemini15FlashLatest => "Gemini 1.5 Flash",
            ModelId::Gemini20FlashExp => "Gemini 2.0 Flash (exp)",
            ModelId::Gemini20FlashThinkingExp1219 => "Gemini 2.0 Thinking",
            ModelId::GeminiExp1206 => "1206 Experimental",
            ModelId::LearnLm15ProExperimental => "LearnLM Pro",
        }
    }

    /// What the model is good at.
    pub fn description(self) -> &'static str {
        match self {
            ModelId::Gemini15FlashLatest => "General purpose",
            ModelId::Gemini20FlashExp => "Better responses",
            ModelId::Gemini20FlashThinkingExp1219 => "Better reasoning",
            ModelId::GeminiExp1206 => "Advanced model for maths and science",
            ModelId::LearnLm15ProExperimental => "Educational focus",
        }
    }
}

impl Default for ModelId {
    fn default() -> Self {
        ModelId::Gemini15FlashLatest
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_id())
    }
}

impl FromStr for ModelId {
    type Err = Error;

    /// Accepts the API id, the display name (any case), or a 1-based menu index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<usize>() {
            return index
                .checked_sub(1)
                .and_then(|i| ModelId::ALL.get(i).copied())
                .ok_or_else(|| {
                    Error::validation(
                        format!("model index must be between 1 and {}", ModelId::ALL.len()),
                        Some("model".to_string()),
                    )
                });
        }
        ModelId::ALL
            .into_iter()
            .find(|m| m.api_id() == s || m.display_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::validation(format!("unknown model: {s}"), Some("model".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_serialization() {
        let json = serde_json::to_string(&ModelId::GeminiExp1206).unwrap();
        assert_eq!(json, r#""gemini-exp-1206""#);

        let model: ModelId = serde_json::from_str(r#""learnlm-1.5-pro-experimental""#).unwrap();
        assert_eq!(model, ModelId::LearnLm15ProExperimental);
    }

    #[test]
    fn display_matches_api_id() {
        for model in ModelId::ALL {
            assert_eq!(model.to_string(), model.api_id());
        }
    }

    #[test]
    fn parse_by_id_name_and_index() {
        assert_eq!(
            "gemini-2.0-flash-exp".parse::<ModelId>().unwrap(),
            ModelId::Gemini20FlashExp
        );
        assert_eq!(
            "gemini 2.0 thinking".parse::<ModelId>().unwrap(),
            ModelId::Gemini20FlashThinkingExp1219
        );
        assert_eq!("1".parse::<ModelId>().unwrap(), ModelId::Gemini15FlashLatest);
        assert_eq!("5".parse::<ModelId>().unwrap(), ModelId::LearnLm15ProExperimental);
        assert!("0".parse::<ModelId>().is_err());
        assert!("6".parse::<ModelId>().is_err());
        assert!("gpt-4".parse::<ModelId>().unwrap_err().is_validation());
    }

    #[test]
    fn default_is_flash() {
        assert_eq!(ModelId::default(), ModelId::Gemini15FlashLatest);
    }
}
