use serde::Deserialize;

use crate::error::Error;

/// Decode-time switches. Every field can be flipped later through the
/// matching `Decoder` setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecoderConfig {
    /// Decode system, token, token-2022 and associated-token instructions
    /// with the built-in tables instead of registered interfaces.
    pub native_decoding: bool,
    /// Extract events from log lines of registered programs.
    pub event_parsing: bool,
    /// Emit a `warn` record for each instruction or event that falls back.
    pub log_failures: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            native_decoding: false,
            event_parsing: true,
            log_failures: true,
        }
    }
}

impl DecoderConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = DecoderConfig::from_json(r#"{"nativeDecoding": true}"#).unwrap();
        assert!(config.native_decoding);
        assert!(config.event_parsing);
        assert!(config.log_failures);
        assert_eq!(DecoderConfig::from_json("{}").unwrap(), DecoderConfig::default());
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(matches!(
            DecoderConfig::from_json(r#"{"eventParsing": "yes"}"#),
            Err(Error::Json(_))
        ));
    }
}
