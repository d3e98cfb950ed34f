use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub type TrackerId = String;
pub type RecordingId = String;

/// Opaque payload held by a log entry. Shared and immutable once recorded.
pub type Payload = Arc<serde_json::Value>;

/// Default invocation arguments for a freshly listed action (an empty array literal)
pub const DEFAULT_ACTION_ARGUMENTS: &str = "[]";

/// Default label given to a new recording
pub const DEFAULT_RECORDING_NAME: &str = "Un-named";

/// Kind of entity being monitored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    ReactiveObservable,
    StateTreeNode,
    PlainValue,
}

impl NodeType {
    /// Map a bridge wire code (0, 1, 2) to a node type
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::ReactiveObservable),
            1 => Some(Self::StateTreeNode),
            2 => Some(Self::PlainValue),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::ReactiveObservable => 0,
            Self::StateTreeNode => 1,
            Self::PlainValue => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ReactiveObservable => "observable",
            Self::StateTreeNode => "state-tree",
            Self::PlainValue => "plain",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// An invocable action exposed by the monitored entity
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionSpec {
    pub name: String,
    /// Raw, operator-editable argument literal (e.g. `[1, "two"]`)
    pub arguments: String,
}

impl ActionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: DEFAULT_ACTION_ARGUMENTS.to_string(),
        }
    }
}

/// A named reference to an externally managed capture session
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Recording {
    pub recording_id: RecordingId,
    pub name: String,
}
