use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::DashboardConfig;
use crate::model::{NodeType, TrackerId};
use crate::tracker::{Tracker, TrackerError};

/// Session state shared between the event pump and readers
pub type SharedDashboard = Arc<RwLock<DashboardState>>;

/// All trackers of one dashboard session
#[derive(Debug)]
pub struct DashboardState {
    pub config: DashboardConfig,
    pub trackers: BTreeMap<TrackerId, Tracker>,
    /// Tracker ids in registration order
    pub order: Vec<TrackerId>,
    pub last_event_id: u64,
}

impl DashboardState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            trackers: BTreeMap::new(),
            order: Vec::new(),
            last_event_id: 0,
        }
    }

    pub fn shared(self) -> SharedDashboard {
        Arc::new(RwLock::new(self))
    }

    /// Register a tracker for a newly monitored entity
    pub fn register(
        &mut self,
        id: &str,
        name: &str,
        node_type: NodeType,
    ) -> Result<&mut Tracker, TrackerError> {
        if self.trackers.contains_key(id) {
            return Err(TrackerError::DuplicateTracker { id: id.to_string() });
        }
        let tracker = Tracker::with_settings(id, name, node_type, self.config.tracker_settings());
        self.order.push(id.to_string());
        Ok(self.trackers.entry(id.to_string()).or_insert(tracker))
    }

    pub fn get(&self, id: &str) -> Option<&Tracker> {
        self.trackers.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Tracker> {
        self.trackers.get_mut(id)
    }

    pub fn tracker_mut(&mut self, id: &str) -> Result<&mut Tracker, TrackerError> {
        self.trackers
            .get_mut(id)
            .ok_or_else(|| TrackerError::TrackerNotFound { id: id.to_string() })
    }

    /// Drop a tracker when its entity leaves the session
    pub fn remove(&mut self, id: &str) -> Option<Tracker> {
        let tracker = self.trackers.remove(id)?;
        self.order.retain(|t| t != id);
        Some(tracker)
    }

    /// Trackers in registration order
    pub fn trackers_ordered(&self) -> Vec<&Tracker> {
        self.order
            .iter()
            .filter_map(|id| self.trackers.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_keeps_order() {
        let mut state = DashboardState::default();
        state.register("b", "second", NodeType::PlainValue).unwrap();
        state.register("a", "first", NodeType::StateTreeNode).unwrap();

        let names: Vec<&str> = state.trackers_ordered().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["second", "first"]);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_register_duplicate() {
        let mut state = DashboardState::default();
        state.register("a", "x", NodeType::PlainValue).unwrap();
        let err = state.register("a", "y", NodeType::PlainValue).unwrap_err();
        assert_eq!(err, TrackerError::DuplicateTracker { id: "a".into() });
        assert_eq!(state.get("a").unwrap().name(), "x");
    }

    #[test]
    fn test_register_applies_config() {
        let config = DashboardConfig {
            recording_name: "untitled".into(),
            ..DashboardConfig::default()
        };
        let mut state = DashboardState::new(config);
        let tracker = state.register("a", "x", NodeType::PlainValue).unwrap();
        tracker.add_recording("r1");
        assert_eq!(state.get("a").unwrap().recordings()[0].name, "untitled");
    }

    #[test]
    fn test_remove() {
        let mut state = DashboardState::default();
        state.register("a", "x", NodeType::PlainValue).unwrap();
        assert!(state.remove("a").is_some());
        assert!(state.remove("a").is_none());
        assert!(state.is_empty());
        assert!(state.order.is_empty());
        assert!(matches!(
            state.tracker_mut("a"),
            Err(TrackerError::TrackerNotFound { .. })
        ));
    }
}
