//! Operator commands issued from the dashboard UI

use serde::{Deserialize, Serialize};

use crate::logs::ChannelKind;
use crate::model::{RecordingId, TrackerId};
use crate::state::DashboardState;
use crate::tracker::TrackerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardCommand {
    Rename {
        tracker: TrackerId,
        name: String,
    },
    SelectTab {
        tracker: TrackerId,
        index: usize,
    },
    SelectAction {
        tracker: TrackerId,
        index: usize,
    },
    /// Edit the selected action's invocation arguments
    EditArguments {
        tracker: TrackerId,
        arguments: String,
    },
    AddRecording {
        tracker: TrackerId,
        recording_id: RecordingId,
    },
    RemoveRecording {
        tracker: TrackerId,
        recording_id: RecordingId,
    },
    RenameRecording {
        tracker: TrackerId,
        recording_id: RecordingId,
        name: String,
    },
    ClearLogs {
        tracker: TrackerId,
    },
    /// Expand or collapse one log entry
    ToggleLog {
        tracker: TrackerId,
        channel: ChannelKind,
        display_number: u64,
        expanded: bool,
    },
}

impl DashboardCommand {
    pub fn tracker_id(&self) -> &TrackerId {
        match self {
            Self::Rename { tracker, .. }
            | Self::SelectTab { tracker, .. }
            | Self::SelectAction { tracker, .. }
            | Self::EditArguments { tracker, .. }
            | Self::AddRecording { tracker, .. }
            | Self::RemoveRecording { tracker, .. }
            | Self::RenameRecording { tracker, .. }
            | Self::ClearLogs { tracker }
            | Self::ToggleLog { tracker, .. } => tracker,
        }
    }
}

/// Apply an operator command to the addressed tracker
pub fn apply(state: &mut DashboardState, cmd: &DashboardCommand) -> Result<(), TrackerError> {
    let tracker = state.tracker_mut(cmd.tracker_id())?;

    match cmd {
        DashboardCommand::Rename { name, .. } => tracker.set_name(name),
        DashboardCommand::SelectTab { index, .. } => tracker.set_selected_tab(*index),
        DashboardCommand::SelectAction { index, .. } => tracker.select_action(*index),
        DashboardCommand::EditArguments { arguments, .. } => tracker.set_action_arguments(arguments),
        DashboardCommand::AddRecording { recording_id, .. } => {
            tracker.add_recording(recording_id.clone())
        }
        DashboardCommand::RemoveRecording { recording_id, .. } => {
            tracker.remove_recording(recording_id)
        }
        DashboardCommand::RenameRecording {
            recording_id, name, ..
        } => tracker.rename_recording(recording_id, name)?,
        DashboardCommand::ClearLogs { .. } => tracker.clear_logs(),
        DashboardCommand::ToggleLog {
            channel,
            display_number,
            expanded,
            ..
        } => tracker.set_log_expanded(*channel, *display_number, *expanded)?,
    }

    Ok(())
}
