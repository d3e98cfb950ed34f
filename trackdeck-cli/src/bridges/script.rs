use std::path::Path;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::mpsc;

use trackdeck_core::bridge::Bridge;
use trackdeck_core::reducer::{EventEnvelope, TrackerEvent};

/// Errors reading an event script
#[derive(Debug)]
pub enum ScriptError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Yaml(e) => write!(f, "YAML parse error: {}", e),
            Self::Json(e) => write!(f, "JSON parse error: {}", e),
        }
    }
}

impl std::error::Error for ScriptError {}

impl From<std::io::Error> for ScriptError {
    fn from(e: std::io::Error) -> Self {
        ScriptError::Io(e)
    }
}

impl From<serde_yaml::Error> for ScriptError {
    fn from(e: serde_yaml::Error) -> Self {
        ScriptError::Yaml(e)
    }
}

impl From<serde_json::Error> for ScriptError {
    fn from(e: serde_json::Error) -> Self {
        ScriptError::Json(e)
    }
}

/// Replays a recorded list of bridge events
pub struct ScriptBridge {
    events: Vec<TrackerEvent>,
}

impl ScriptBridge {
    pub fn new(events: Vec<TrackerEvent>) -> Self {
        Self { events }
    }

    /// Load a script; `.json` files are parsed as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, ScriptError> {
        Ok(Self::new(serde_yaml::from_str(content)?))
    }

    pub fn from_json(content: &str) -> Result<Self, ScriptError> {
        Ok(Self::new(serde_json::from_str(content)?))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[async_trait]
impl Bridge for ScriptBridge {
    fn name(&self) -> &'static str {
        "script"
    }

    async fn run(&mut self, event_tx: mpsc::Sender<EventEnvelope>) {
        for (next_id, event) in (1u64..).zip(self.events.drain(..)) {
            let env = EventEnvelope {
                id: next_id,
                at: SystemTime::now(),
                event,
            };
            if event_tx.send(env).await.is_err() {
                tracing::warn!("session closed before script finished");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_script() {
        let yaml = r#"
- type: registered
  id: todos
  name: TodoStore
  node_type: state_tree_node
- type: actions_listed
  id: todos
  actions: [addTodo, toggle]
- type: patched
  id: todos
  value: { todos: [] }
  patch: { op: replace, path: /todos, value: [] }
"#;
        let bridge = ScriptBridge::from_yaml(yaml).unwrap();
        assert_eq!(bridge.len(), 3);
        assert!(matches!(bridge.events[2], TrackerEvent::Patched { .. }));
    }

    #[test]
    fn test_parse_json_script() {
        let json = r#"[{"type": "touched", "id": "t"}]"#;
        let bridge = ScriptBridge::from_json(json).unwrap();
        assert_eq!(bridge.events, vec![TrackerEvent::Touched { id: "t".into() }]);
    }

    #[test]
    fn test_unknown_event_type() {
        let result = ScriptBridge::from_json(r#"[{"type": "exploded", "id": "t"}]"#);
        assert!(matches!(result, Err(ScriptError::Json(_))));
    }

    #[tokio::test]
    async fn test_run_numbers_envelopes() {
        let mut bridge = ScriptBridge::new(vec![
            TrackerEvent::Touched { id: "a".into() },
            TrackerEvent::Touched { id: "b".into() },
        ]);
        let (tx, mut rx) = mpsc::channel(4);
        bridge.run(tx).await;

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert!(rx.recv().await.is_none());
    }
}
