//! The broadcast relay: fire-and-forget fan-out of data-change events to
//! connected WebSocket clients. Handlers publish through the [`Broadcaster`]
//! trait so tests can substitute a recording implementation.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::state::ApiState;
use pitstop_db::{Car, Task};

/// A named data-change notification. The payload is the created/updated
/// entity, or `{"id"}` for deletions.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: &'static str,
    pub data: Value,
}

impl Event {
    pub fn car_added(car: &Car) -> Self {
        Self::entity("car-added", car)
    }

    pub fn car_updated(car: &Car) -> Self {
        Self::entity("car-updated", car)
    }

    pub fn car_deleted(id: i64) -> Self {
        Self {
            name: "car-deleted",
            data: json!({ "id": id }),
        }
    }

    pub fn task_added(task: &Task) -> Self {
        Self::entity("task-added", task)
    }

    pub fn task_updated(task: &Task) -> Self {
        Self::entity("task-updated", task)
    }

    pub fn task_deleted(id: i64) -> Self {
        Self {
            name: "task-deleted",
            data: json!({ "id": id }),
        }
    }

    fn entity(name: &'static str, payload: &impl Serialize) -> Self {
        Self {
            name,
            data: serde_json::to_value(payload).unwrap_or(Value::Null),
        }
    }
}

/// Publish side of the relay, injected into request handlers.
pub trait Broadcaster: Send + Sync {
    /// Publish an event to every client connected at emit time.
    fn publish(&self, event: Event);

    /// Subscribe to the serialized event stream.
    fn subscribe(&self) -> broadcast::Receiver<String>;
}

/// Production relay backed by a bounded broadcast channel. Slow consumers
/// lag and drop frames rather than applying backpressure.
pub struct EventRelay {
    tx: broadcast::Sender<String>,
}

impl EventRelay {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Broadcaster for EventRelay {
    fn publish(&self, event: Event) {
        let frame = json!({ "event": event.name, "data": event.data }).to_string();
        // Send fails only when nobody is connected; fire-and-forget either way.
        let _ = self.tx.send(frame);
        tracing::debug!(event = event.name, "event published");
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

pub async fn ws_handler(State(state): State<ApiState>, ws: WebSocketUpgrade) -> Response {
    let rx = state.broadcaster.subscribe();
    ws.on_upgrade(move |socket| relay_connection(socket, rx))
}

async fn relay_connection(socket: WebSocket, mut rx: broadcast::Receiver<String>) {
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(frame) => {
                    if sender.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "slow relay client, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Clients only listen; drain the incoming side until the socket closes.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}
