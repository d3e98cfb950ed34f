//! The tracker: everything the dashboard knows about one monitored entity
//!
//! A tracker owns its action registry, three log channels, recording
//! registry and the latest observed value. All mutation goes through
//! `&mut self` methods; each one bumps the revision and publishes a
//! [`TrackerChange`] so UI bindings can invalidate precisely.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::MAX_CHANNEL_CAPACITY;
use crate::logs::{ChannelKind, TrackerLogs, format_log_time};
use crate::model::{
    ActionSpec, DEFAULT_RECORDING_NAME, NodeType, Payload, Recording, RecordingId, TrackerId,
};

/// Errors surfaced by tracker and session operations
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackerError {
    /// No recording with this id in the tracker's registry
    RecordingNotFound {
        tracker: TrackerId,
        recording_id: RecordingId,
    },
    /// No entry with this display number in the channel
    LogEntryNotFound {
        tracker: TrackerId,
        channel: ChannelKind,
        display_number: u64,
    },
    /// Event or command addressed to an unregistered tracker
    TrackerNotFound { id: TrackerId },
    /// A tracker with this id is already registered
    DuplicateTracker { id: TrackerId },
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecordingNotFound {
                tracker,
                recording_id,
            } => write!(f, "recording '{}' not found in tracker '{}'", recording_id, tracker),
            Self::LogEntryNotFound {
                tracker,
                channel,
                display_number,
            } => write!(
                f,
                "no entry #{} in {} of tracker '{}'",
                display_number, channel, tracker
            ),
            Self::TrackerNotFound { id } => write!(f, "tracker not found: {}", id),
            Self::DuplicateTracker { id } => write!(f, "tracker already registered: {}", id),
        }
    }
}

impl std::error::Error for TrackerError {}

/// Which part of a tracker a mutation touched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerField {
    Name,
    UpdatedOn,
    Value,
    Actions,
    SelectedAction,
    SelectedTab,
    ActionLogs,
    Patches,
    Snapshots,
    Recordings,
    /// All three log channels at once
    Logs,
}

impl From<ChannelKind> for TrackerField {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::ActionLogs => TrackerField::ActionLogs,
            ChannelKind::Patches => TrackerField::Patches,
            ChannelKind::Snapshots => TrackerField::Snapshots,
        }
    }
}

/// Notification published after every applied mutation.
///
/// A log append that also refreshes the cached value is published as a
/// single change naming the channel; readers of `value` should treat channel
/// changes as value changes too.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackerChange {
    pub tracker: TrackerId,
    pub revision: u64,
    pub field: TrackerField,
}

/// Per-tracker knobs, usually derived from the dashboard config
#[derive(Clone, Debug)]
pub struct TrackerSettings {
    /// Capacity of the change broadcast channel
    pub change_buffer: usize,
    /// Custom strftime format for log timestamps
    pub timestamp_format: Option<String>,
    /// Name given to new recordings
    pub recording_name: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            change_buffer: 256,
            timestamp_format: None,
            recording_name: DEFAULT_RECORDING_NAME.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Tracker {
    id: TrackerId,
    node_type: NodeType,
    name: String,
    updated_on: SystemTime,
    value: serde_json::Value,
    actions: Vec<ActionSpec>,
    selected_action_index: usize,
    selected_tab: usize,
    logs: TrackerLogs,
    recordings: Vec<Recording>,
    revision: u64,

    #[serde(skip)]
    settings: TrackerSettings,
    #[serde(skip)]
    changes: broadcast::Sender<TrackerChange>,
}

impl Tracker {
    pub fn new(id: impl Into<TrackerId>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self::with_settings(id, name, node_type, TrackerSettings::default())
    }

    pub fn with_settings(
        id: impl Into<TrackerId>,
        name: impl Into<String>,
        node_type: NodeType,
        settings: TrackerSettings,
    ) -> Self {
        let capacity = settings.change_buffer.clamp(1, MAX_CHANNEL_CAPACITY);
        let (changes, _) = broadcast::channel(capacity);
        Self {
            id: id.into(),
            node_type,
            name: name.into(),
            updated_on: SystemTime::now(),
            value: serde_json::Value::Object(serde_json::Map::new()),
            actions: Vec::new(),
            selected_action_index: 0,
            selected_tab: 0,
            logs: TrackerLogs::default(),
            recordings: Vec::new(),
            revision: 0,
            settings,
            changes,
        }
    }

    /// Subscribe to change notifications for this tracker
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerChange> {
        self.changes.subscribe()
    }

    fn touch(&mut self, field: TrackerField) {
        self.revision += 1;
        let _ = self.changes.send(TrackerChange {
            tracker: self.id.clone(),
            revision: self.revision,
            field,
        });
    }

    // ---- read side ----

    pub fn id(&self) -> &TrackerId {
        &self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn updated_on(&self) -> SystemTime {
        self.updated_on
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }

    pub fn actions(&self) -> &[ActionSpec] {
        &self.actions
    }

    pub fn selected_action_index(&self) -> usize {
        self.selected_action_index
    }

    pub fn selected_tab(&self) -> usize {
        self.selected_tab
    }

    pub fn logs(&self) -> &TrackerLogs {
        &self.logs
    }

    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    /// Monotonic mutation counter, bumped once per applied operation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The selected action, or `None` when the registry is empty or the
    /// index is stale after a shrink
    pub fn selected_action(&self) -> Option<&ActionSpec> {
        self.actions.get(self.selected_action_index)
    }

    /// Arguments of the selected action, or `""` with no valid selection
    pub fn action_arguments(&self) -> &str {
        self.selected_action()
            .map(|a| a.arguments.as_str())
            .unwrap_or("")
    }

    // ---- identity & value ----

    /// Empty names are ignored; the name is never cleared.
    pub fn set_name(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        self.name = name.to_string();
        self.touch(TrackerField::Name);
    }

    pub fn set_updated_time(&mut self, at: SystemTime) {
        self.updated_on = at;
        self.touch(TrackerField::UpdatedOn);
    }

    pub fn set_value(&mut self, value: serde_json::Value) {
        self.value = value;
        self.touch(TrackerField::Value);
    }

    // ---- action registry & selection ----

    /// Replace the action registry. `None` or an empty list keeps the
    /// current registry. Argument edits on the old registry are discarded.
    pub fn add_actions<I, S>(&mut self, names: Option<I>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(names) = names else {
            return;
        };
        let actions: Vec<ActionSpec> = names.into_iter().map(ActionSpec::new).collect();
        if actions.is_empty() {
            return;
        }
        self.actions = actions;
        self.touch(TrackerField::Actions);
    }

    pub fn set_selected_tab(&mut self, index: usize) {
        self.selected_tab = index;
        self.touch(TrackerField::SelectedTab);
    }

    /// Select an action by index. Not validated against the registry; a
    /// stale index reads as "no selection".
    pub fn select_action(&mut self, index: usize) {
        self.selected_action_index = index;
        self.touch(TrackerField::SelectedAction);
    }

    /// Overwrite the selected action's arguments. Ignored when the registry
    /// is empty or the selection is out of range.
    pub fn set_action_arguments(&mut self, value: &str) {
        let Some(action) = self.actions.get_mut(self.selected_action_index) else {
            return;
        };
        action.arguments = value.to_string();
        self.touch(TrackerField::Actions);
    }

    // ---- log channels ----

    /// Shared prepend-with-numbering path. Every append also refreshes the
    /// cached value, whichever channel it lands in.
    fn append(
        &mut self,
        kind: ChannelKind,
        stamped: bool,
        value: serde_json::Value,
        item: Payload,
    ) -> u64 {
        self.value = value;
        let time = stamped.then(|| {
            format_log_time(SystemTime::now(), self.settings.timestamp_format.as_deref())
        });
        let number = self.logs.channel_mut(kind).add_to_top(time, item);
        self.touch(kind.into());
        number
    }

    /// Record an "observed value changed" notice. Stamped with the time.
    pub fn add_observe_log(&mut self, value: serde_json::Value, description: Payload) -> u64 {
        self.append(ChannelKind::ActionLogs, true, value, description)
    }

    /// Record an action invocation. Not stamped.
    pub fn add_action_log(&mut self, value: serde_json::Value, action_meta: Payload) -> u64 {
        self.append(ChannelKind::ActionLogs, false, value, action_meta)
    }

    /// Record a structural patch. Not stamped.
    pub fn add_patch(&mut self, value: serde_json::Value, patch: Payload) -> u64 {
        self.append(ChannelKind::Patches, false, value, patch)
    }

    /// Record a full-state snapshot. Stamped with the time.
    pub fn add_snapshot(&mut self, value: serde_json::Value, snapshot: Payload) -> u64 {
        self.append(ChannelKind::Snapshots, true, value, snapshot)
    }

    /// Empty all three channels. Actions, recordings and value are kept.
    pub fn clear_logs(&mut self) {
        self.logs.clear();
        self.touch(TrackerField::Logs);
    }

    pub fn set_log_expanded(
        &mut self,
        channel: ChannelKind,
        display_number: u64,
        expanded: bool,
    ) -> Result<(), TrackerError> {
        let Some(entry) = self.logs.channel_mut(channel).find_mut(display_number) else {
            return Err(TrackerError::LogEntryNotFound {
                tracker: self.id.clone(),
                channel,
                display_number,
            });
        };
        entry.is_expanded = expanded;
        self.touch(channel.into());
        Ok(())
    }

    // ---- recordings ----

    /// Append a recording at the tail under the default name.
    /// An id that is already registered is left alone.
    pub fn add_recording(&mut self, recording_id: impl Into<RecordingId>) {
        let recording_id = recording_id.into();
        if self.recordings.iter().any(|r| r.recording_id == recording_id) {
            return;
        }
        self.recordings.push(Recording {
            recording_id,
            name: self.settings.recording_name.clone(),
        });
        self.touch(TrackerField::Recordings);
    }

    /// Remove a recording by id; a missing id is a no-op.
    pub fn remove_recording(&mut self, recording_id: &str) {
        let Some(pos) = self
            .recordings
            .iter()
            .position(|r| r.recording_id == recording_id)
        else {
            return;
        };
        self.recordings.remove(pos);
        self.touch(TrackerField::Recordings);
    }

    pub fn rename_recording(&mut self, recording_id: &str, name: &str) -> Result<(), TrackerError> {
        let Some(recording) = self
            .recordings
            .iter_mut()
            .find(|r| r.recording_id == recording_id)
        else {
            return Err(TrackerError::RecordingNotFound {
                tracker: self.id.clone(),
                recording_id: recording_id.to_string(),
            });
        };
        recording.name = name.to_string();
        self.touch(TrackerField::Recordings);
        Ok(())
    }
}

/// Wrap a JSON value as a shareable log payload
pub fn payload(value: serde_json::Value) -> Payload {
    Arc::new(value)
}
