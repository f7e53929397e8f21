//! Named, ordered action sequences and their persisted form

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::Action;
use crate::error::{MacroError, Result};

/// A named macro. Action order is playback order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub actions: Vec<Action>,
}

impl Default for Script {
    fn default() -> Self {
        Self::new("New Script")
    }
}

impl Script {
    /// Create an empty script
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// Create an empty script named after the current local time,
    /// e.g. `Script_20250301_142210`
    pub fn with_timestamp_name() -> Self {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        Self::new(format!("Script_{stamp}"))
    }

    /// Append an action at the end
    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Serialize to a pretty-printed JSON document
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| MacroError::MalformedScript(e.to_string()))
    }

    /// Parse a JSON document. Nothing is returned unless the whole document is valid.
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| MacroError::MalformedScript(e.to_string()))
    }

    /// Serialize to MessagePack bytes
    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|e| MacroError::MalformedScript(e.to_string()))
    }

    /// Deserialize from MessagePack bytes
    pub fn from_msgpack(data: &[u8]) -> Result<Self> {
        rmp_serde::from_slice(data).map_err(|e| MacroError::MalformedScript(e.to_string()))
    }

    /// Load a script, picking the format from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        if is_msgpack(path) {
            let data = std::fs::read(path)?;
            Self::from_msgpack(&data)
        } else {
            let data = std::fs::read_to_string(path)?;
            Self::from_json(&data)
        }
    }

    /// Save a script, picking the format from the file extension
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        if is_msgpack(path) {
            std::fs::write(path, self.to_msgpack()?)?;
        } else {
            std::fs::write(path, self.to_json()?)?;
        }
        Ok(())
    }
}

fn is_msgpack(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("mpk") | Some("msgpack")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_kind() -> Script {
        Script {
            name: "every kind".to_string(),
            actions: vec![
                Action::KeyDown { key_code: 65 },
                Action::delay(500),
                Action::KeyUp { key_code: 65 },
                Action::KeyPress { key_code: 13 },
                Action::MouseLeftDown { x: 10, y: 20 },
                Action::MouseLeftUp { x: 10, y: 20 },
                Action::MouseRightDown { x: -1920, y: 5 },
                Action::MouseRightUp { x: -1920, y: 5 },
                Action::MouseClick { x: 300, y: 400 },
                Action::MouseLongPress { x: 7, y: 8, duration_ms: 1200 },
                Action::delay(0),
            ],
        }
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let script = every_kind();
        let json = script.to_json().unwrap();
        assert_eq!(Script::from_json(&json).unwrap(), script);

        let empty = Script::new("empty");
        assert_eq!(Script::from_json(&empty.to_json().unwrap()).unwrap(), empty);
    }

    #[test]
    fn test_msgpack_round_trip() {
        let script = every_kind();
        let bytes = script.to_msgpack().unwrap();
        assert_eq!(Script::from_msgpack(&bytes).unwrap(), script);
    }

    #[test]
    fn test_absent_optional_fields_default_to_zero() {
        let json = r#"{
            "name": "sparse",
            "actions": [
                { "type": "KeyPress" },
                { "type": "MouseLongPress", "x": 4 },
                { "type": "Delay" }
            ]
        }"#;

        let script = Script::from_json(json).unwrap();
        assert_eq!(
            script.actions,
            vec![
                Action::KeyPress { key_code: 0 },
                Action::MouseLongPress { x: 4, y: 0, duration_ms: 0 },
                Action::delay(0),
            ]
        );
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        let unknown_kind = r#"{ "name": "x", "actions": [ { "type": "Teleport" } ] }"#;
        let missing_actions = r#"{ "name": "x" }"#;
        let missing_type = r#"{ "name": "x", "actions": [ { "keyCode": 65 } ] }"#;

        for doc in [unknown_kind, missing_actions, missing_type, "not json"] {
            match Script::from_json(doc) {
                Err(MacroError::MalformedScript(_)) => {}
                other => panic!("expected MalformedScript for {doc}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_save_and_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let script = every_kind();

        for file in ["macro.json", "nested/macro.mpk"] {
            let path = dir.path().join(file);
            script.save(&path).unwrap();
            assert_eq!(Script::load(&path).unwrap(), script);
        }

        let text = std::fs::read_to_string(dir.path().join("macro.json")).unwrap();
        assert!(text.contains("\"durationMs\": 1200"));
    }

    #[test]
    fn test_timestamp_name() {
        let script = Script::with_timestamp_name();
        assert!(script.name.starts_with("Script_"));
        assert_eq!(script.name.len(), "Script_20250101_000000".len());
        assert!(script.is_empty());
    }
}
