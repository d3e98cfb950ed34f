//! Log channels kept per tracker
//!
//! Each channel is newest-first. Entries get a display number at append
//! time that is never reassigned, so numbers are sequence labels rather than
//! positions.

use std::collections::VecDeque;
use std::fmt::Write;
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};

use crate::model::Payload;

/// Which log channel an entry belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Invoked actions and "observed value changed" notices
    ActionLogs,
    Patches,
    Snapshots,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ActionLogs => write!(f, "action logs"),
            Self::Patches => write!(f, "patches"),
            Self::Snapshots => write!(f, "snapshots"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    pub display_number: u64,
    /// Human-readable time; only some producers stamp their entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub is_expanded: bool,
    pub value: Payload,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct LogChannel {
    entries: VecDeque<LogEntry>,
}

impl LogChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry, numbering it against the pre-insertion length.
    /// Returns the assigned display number.
    pub fn add_to_top(&mut self, time: Option<String>, value: Payload) -> u64 {
        let display_number = self.entries.len() as u64 + 1;
        self.entries.push_front(LogEntry {
            display_number,
            time,
            is_expanded: false,
            value,
        });
        display_number
    }

    /// Newest entry, if any
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    pub fn find_mut(&mut self, display_number: u64) -> Option<&mut LogEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.display_number == display_number)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The three independent channels of a tracker
#[derive(Clone, Debug, Default, Serialize)]
pub struct TrackerLogs {
    pub action_logs: LogChannel,
    pub patches: LogChannel,
    pub snapshots: LogChannel,
}

impl TrackerLogs {
    pub fn channel(&self, kind: ChannelKind) -> &LogChannel {
        match kind {
            ChannelKind::ActionLogs => &self.action_logs,
            ChannelKind::Patches => &self.patches,
            ChannelKind::Snapshots => &self.snapshots,
        }
    }

    pub fn channel_mut(&mut self, kind: ChannelKind) -> &mut LogChannel {
        match kind {
            ChannelKind::ActionLogs => &mut self.action_logs,
            ChannelKind::Patches => &mut self.patches,
            ChannelKind::Snapshots => &mut self.snapshots,
        }
    }

    pub fn clear(&mut self) {
        self.action_logs.clear();
        self.patches.clear();
        self.snapshots.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.action_logs.is_empty() && self.patches.is_empty() && self.snapshots.is_empty()
    }
}

/// Format a log timestamp.
///
/// With no custom format this renders e.g. "Saturday, October 17th 2026, 3:04:05 pm".
/// A custom format is passed to chrono's strftime formatter as-is.
pub fn format_log_time(at: SystemTime, custom: Option<&str>) -> String {
    let local: DateTime<Local> = at.into();
    if let Some(fmt) = custom {
        // chrono reports bad specifiers as a fmt error; fall back to the human format
        let mut out = String::new();
        if write!(out, "{}", local.format(fmt)).is_ok() {
            return out;
        }
    }
    format!(
        "{}, {} {}{} {}",
        local.format("%A"),
        local.format("%B"),
        local.day(),
        ordinal_suffix(local.day()),
        local.format("%Y, %-I:%M:%S %P"),
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn payload(n: i64) -> Payload {
        Arc::new(serde_json::json!(n))
    }

    #[test]
    fn test_add_to_top_prepends_and_numbers() {
        let mut channel = LogChannel::new();
        assert_eq!(channel.add_to_top(None, payload(1)), 1);
        assert_eq!(channel.add_to_top(None, payload(2)), 2);
        assert_eq!(channel.add_to_top(None, payload(3)), 3);

        let numbers: Vec<u64> = channel.iter().map(|e| e.display_number).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
        assert_eq!(*channel.latest().unwrap().value, serde_json::json!(3));
        assert!(channel.iter().all(|e| !e.is_expanded));
    }

    #[test]
    fn test_numbering_restarts_after_clear() {
        let mut channel = LogChannel::new();
        channel.add_to_top(None, payload(1));
        channel.add_to_top(None, payload(2));
        channel.clear();
        assert!(channel.is_empty());
        assert_eq!(channel.add_to_top(None, payload(3)), 1);
    }

    #[test]
    fn test_find_by_display_number() {
        let mut channel = LogChannel::new();
        channel.add_to_top(None, payload(10));
        channel.add_to_top(None, payload(20));
        let entry = channel.find_mut(1).unwrap();
        assert_eq!(*entry.value, serde_json::json!(10));
        assert!(channel.find_mut(5).is_none());
    }

    #[test]
    fn test_ordinal_suffix() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(2), "nd");
        assert_eq!(ordinal_suffix(3), "rd");
        assert_eq!(ordinal_suffix(4), "th");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(13), "th");
        assert_eq!(ordinal_suffix(21), "st");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(31), "st");
    }

    #[test]
    fn test_format_log_time_custom() {
        let at = SystemTime::UNIX_EPOCH;
        let formatted = format_log_time(at, Some("%Y"));
        assert!(formatted == "1970" || formatted == "1969");
        let bad = format_log_time(SystemTime::now(), Some("%Q"));
        assert!(bad.ends_with("am") || bad.ends_with("pm"));
        let human = format_log_time(SystemTime::now(), None);
        assert!(human.contains(", "));
        assert!(human.ends_with("am") || human.ends_with("pm"));
    }
}
