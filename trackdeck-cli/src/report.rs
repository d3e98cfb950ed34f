use std::time::SystemTime;

use trackdeck_core::bridge::PumpStats;
use trackdeck_core::logs::{LogChannel, format_log_time};
use trackdeck_core::state::DashboardState;
use trackdeck_core::tracker::Tracker;

/// Longest value preview printed in the text report
const PREVIEW_LEN: usize = 96;

fn preview(value: &serde_json::Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= PREVIEW_LEN {
        return text;
    }
    let cut: String = text.chars().take(PREVIEW_LEN).collect();
    format!("{}…", cut)
}

fn channel_line(label: &str, channel: &LogChannel) -> String {
    match channel.latest() {
        Some(entry) => {
            let time = entry
                .time
                .as_deref()
                .map(|t| format!(" at {}", t))
                .unwrap_or_default();
            format!(
                "  {:<12} {:>4} (latest #{}{}) {}",
                label,
                channel.len(),
                entry.display_number,
                time,
                preview(&entry.value)
            )
        }
        None => format!("  {:<12} {:>4}", label, 0),
    }
}

pub fn render_tracker(tracker: &Tracker, timestamp_format: Option<&str>) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} [{}] ({})",
        tracker.name(),
        tracker.node_type(),
        tracker.id()
    ));
    lines.push(format!(
        "  updated      {}",
        format_log_time(tracker.updated_on(), timestamp_format)
    ));
    lines.push(format!("  value        {}", preview(tracker.value())));

    if !tracker.actions().is_empty() {
        lines.push("  actions".to_string());
        for (i, action) in tracker.actions().iter().enumerate() {
            let marker = if i == tracker.selected_action_index() {
                "▸"
            } else {
                " "
            };
            lines.push(format!("   {} {} {}", marker, action.name, action.arguments));
        }
    }

    let logs = tracker.logs();
    lines.push(channel_line("action logs", &logs.action_logs));
    lines.push(channel_line("patches", &logs.patches));
    lines.push(channel_line("snapshots", &logs.snapshots));

    for recording in tracker.recordings() {
        lines.push(format!(
            "  recording    {} ({})",
            recording.name, recording.recording_id
        ));
    }

    lines.join("\n")
}

pub fn print_text(state: &DashboardState, stats: &PumpStats, started: SystemTime) {
    let elapsed = started.elapsed().unwrap_or_default();
    println!(
        "{} tracker(s), {} event(s) applied, {} rejected in {:.1?}\n",
        state.len(),
        stats.applied,
        stats.rejected,
        elapsed
    );
    for tracker in state.trackers_ordered() {
        println!(
            "{}\n",
            render_tracker(tracker, state.config.timestamp_format.as_deref())
        );
    }
}

pub fn print_json(state: &DashboardState) -> serde_json::Result<()> {
    let trackers = state.trackers_ordered();
    println!("{}", serde_json::to_string_pretty(&trackers)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trackdeck_core::model::NodeType;
    use trackdeck_core::tracker::payload;

    #[test]
    fn test_preview_truncates() {
        let long = json!("x".repeat(500));
        let text = preview(&long);
        assert!(text.ends_with('…'));
        assert_eq!(text.chars().count(), PREVIEW_LEN + 1);
        assert_eq!(preview(&json!(1)), "1");
    }

    #[test]
    fn test_render_marks_selected_action() {
        let mut tracker = Tracker::new("t", "TodoStore", NodeType::StateTreeNode);
        tracker.add_actions(Some(["addTodo", "toggle"]));
        tracker.select_action(1);
        tracker.add_patch(json!({"n": 1}), payload(json!({"op": "add"})));
        tracker.add_recording("r1");

        let text = render_tracker(&tracker, Some("%H:%M"));
        assert!(text.starts_with("TodoStore [state-tree] (t)"));
        assert!(text.contains("▸ toggle []"));
        assert!(text.contains("latest #1"));
        assert!(text.contains("Un-named (r1)"));
    }
}
