use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use uuid::Uuid;

use trackdeck_core::bridge::Bridge;
use trackdeck_core::model::NodeType;
use trackdeck_core::reducer::{EventEnvelope, TrackerEvent};

/// Simulates an instrumented todo app: one state-tree store and one plain
/// observable counter.
pub struct DemoBridge {
    tick_interval: Duration,
    ticks: u64,
    store_id: String,
    counter_id: String,
}

impl DemoBridge {
    pub fn new(ticks: u64) -> Self {
        Self {
            tick_interval: Duration::from_millis(20),
            ticks,
            store_id: Uuid::new_v4().to_string(),
            counter_id: Uuid::new_v4().to_string(),
        }
    }

    #[allow(dead_code)]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    fn todos(count: u64) -> Value {
        let todos: Vec<Value> = (1..=count)
            .map(|n| json!({ "title": format!("todo {}", n), "done": n % 3 == 0 }))
            .collect();
        json!({ "todos": todos })
    }
}

#[async_trait]
impl Bridge for DemoBridge {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn run(&mut self, event_tx: mpsc::Sender<EventEnvelope>) {
        let mut next_id: u64 = 1;
        let mut queue = Vec::new();

        queue.push(TrackerEvent::Registered {
            id: self.store_id.clone(),
            name: "TodoStore".into(),
            node_type: NodeType::StateTreeNode,
        });
        queue.push(TrackerEvent::ActionsListed {
            id: self.store_id.clone(),
            actions: vec!["addTodo".into(), "toggleTodo".into(), "clearDone".into()],
        });
        queue.push(TrackerEvent::Registered {
            id: self.counter_id.clone(),
            name: "visits".into(),
            node_type: NodeType::ReactiveObservable,
        });

        let mut tick = tokio::time::interval(self.tick_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        for n in 1..=self.ticks {
            for event in queue.drain(..) {
                let env = EventEnvelope {
                    id: next_id,
                    at: SystemTime::now(),
                    event,
                };
                if event_tx.send(env).await.is_err() {
                    return;
                }
                next_id += 1;
            }

            tick.tick().await;

            let value = Self::todos(n);
            queue.push(TrackerEvent::ActionInvoked {
                id: self.store_id.clone(),
                value: value.clone(),
                action: json!({ "name": "addTodo", "args": [format!("todo {}", n)] }),
            });
            queue.push(TrackerEvent::Patched {
                id: self.store_id.clone(),
                value: value.clone(),
                patch: json!({
                    "op": "add",
                    "path": format!("/todos/{}", n - 1),
                    "value": { "title": format!("todo {}", n), "done": n % 3 == 0 },
                }),
            });
            queue.push(TrackerEvent::Snapshotted {
                id: self.store_id.clone(),
                value: value.clone(),
                snapshot: value,
            });
            queue.push(TrackerEvent::Observed {
                id: self.counter_id.clone(),
                value: json!(n),
                description: json!({ "type": "update", "oldValue": n - 1, "newValue": n }),
            });
        }

        queue.push(TrackerEvent::Touched {
            id: self.store_id.clone(),
        });
        for event in queue.drain(..) {
            let env = EventEnvelope {
                id: next_id,
                at: SystemTime::now(),
                event,
            };
            if event_tx.send(env).await.is_err() {
                return;
            }
            next_id += 1;
        }
    }
}
