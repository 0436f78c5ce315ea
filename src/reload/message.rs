// src/reload/message.rs

use serde::{Deserialize, Serialize};

/// Wire messages sent to connected browsers.
///
/// Encoded as JSON with a `type` discriminant so the client script can
/// dispatch with a single `switch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Sent once on connect so the client can detect server restarts.
    Connected { version: String },
    /// Full page reload.
    Reload,
    /// Stylesheet-only refresh; `files` lists the changed css paths.
    Css { files: Vec<String> },
}

impl ReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        // Serialization of these variants cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_message_carries_files() {
        let msg = ReloadMessage::Css {
            files: vec!["css/main.css".into()],
        };
        let json = msg.to_json();
        assert_eq!(json, r#"{"type":"css","files":["css/main.css"]}"#);

        let back: ReloadMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn reload_message_is_bare() {
        assert_eq!(ReloadMessage::Reload.to_json(), r#"{"type":"reload"}"#);
    }
}
