use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{NodeType, TrackerId};
use crate::state::DashboardState;
use crate::tracker::{TrackerError, payload};

/// Events pushed by the instrumentation bridge
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// A new entity is being monitored
    Registered {
        id: TrackerId,
        name: String,
        node_type: NodeType,
    },
    Renamed {
        id: TrackerId,
        name: String,
    },
    /// The entity's invocable actions were (re)listed
    ActionsListed {
        id: TrackerId,
        actions: Vec<String>,
    },
    /// A plain observable changed
    Observed {
        id: TrackerId,
        value: Value,
        description: Value,
    },
    ActionInvoked {
        id: TrackerId,
        value: Value,
        action: Value,
    },
    Patched {
        id: TrackerId,
        value: Value,
        patch: Value,
    },
    Snapshotted {
        id: TrackerId,
        value: Value,
        snapshot: Value,
    },
    ValueChanged {
        id: TrackerId,
        value: Value,
    },
    /// Stamp the tracker's updated time with the envelope time
    Touched {
        id: TrackerId,
    },
}

impl TrackerEvent {
    pub fn tracker_id(&self) -> &TrackerId {
        match self {
            Self::Registered { id, .. }
            | Self::Renamed { id, .. }
            | Self::ActionsListed { id, .. }
            | Self::Observed { id, .. }
            | Self::ActionInvoked { id, .. }
            | Self::Patched { id, .. }
            | Self::Snapshotted { id, .. }
            | Self::ValueChanged { id, .. }
            | Self::Touched { id } => id,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EventEnvelope {
    pub id: u64,
    pub at: SystemTime,
    pub event: TrackerEvent,
}

/// Apply one bridge event to the session.
///
/// `last_event_id` advances even when the event is rejected so the pump
/// can report where a stream went wrong.
pub fn reduce(state: &mut DashboardState, env: &EventEnvelope) -> Result<(), TrackerError> {
    state.last_event_id = env.id;

    match &env.event {
        TrackerEvent::Registered {
            id,
            name,
            node_type,
        } => {
            state.register(id, name, *node_type)?;
        }
        TrackerEvent::Renamed { id, name } => state.tracker_mut(id)?.set_name(name),
        TrackerEvent::ActionsListed { id, actions } => {
            state.tracker_mut(id)?.add_actions(Some(actions.iter().cloned()))
        }
        TrackerEvent::Observed {
            id,
            value,
            description,
        } => {
            state
                .tracker_mut(id)?
                .add_observe_log(value.clone(), payload(description.clone()));
        }
        TrackerEvent::ActionInvoked { id, value, action } => {
            state
                .tracker_mut(id)?
                .add_action_log(value.clone(), payload(action.clone()));
        }
        TrackerEvent::Patched { id, value, patch } => {
            state
                .tracker_mut(id)?
                .add_patch(value.clone(), payload(patch.clone()));
        }
        TrackerEvent::Snapshotted {
            id,
            value,
            snapshot,
        } => {
            state
                .tracker_mut(id)?
                .add_snapshot(value.clone(), payload(snapshot.clone()));
        }
        TrackerEvent::ValueChanged { id, value } => state.tracker_mut(id)?.set_value(value.clone()),
        TrackerEvent::Touched { id } => state.tracker_mut(id)?.set_updated_time(env.at),
    }

    Ok(())
}
