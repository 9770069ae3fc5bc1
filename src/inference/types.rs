use serde::{Deserialize, Serialize};

/// Who authored a turn in the remote session's history.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One completed exchange entry held by the session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            text: text.into(),
        }
    }
}

/// Sampling settings fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4000;

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// A piece of a streamed reply, as produced by a backend.
///
/// `Text` carries a delta. Turning deltas into cumulative text is the
/// session's job, not the backend's.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Text(String),
    Completed { finish_reason: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_constructors_set_roles() {
        assert_eq!(Turn::user("hi").role, TurnRole::User);
        assert_eq!(Turn::model("hello").role, TurnRole::Model);
    }

    #[test]
    fn turn_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TurnRole::Model).unwrap(), "\"model\"");
    }

    #[test]
    fn generation_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_output_tokens, 4000);
    }
}
