//! Progress Sink
//!
//! A [`ProgressSink`] is the handle a grading run uses to report what it is doing. Calls never block
//! and never fail: messages go onto an unbounded queue, and a separate delivery task started by
//! [`spawn_delivery`] broadcasts them to whoever is subscribed to the submitter's topic.
//!
//! ```text
//! Grader ──update()/notify_error()──▶ queue ──▶ delivery task ──▶ WebSocketManager
//!                                                                   └─ submissions/<netId>
//! ```
//!
//! A slow or absent listener therefore never holds up the pipeline; the broadcast channel drops
//! messages for lagging receivers rather than waiting for them.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use util::ws::{WebSocketManager, emit};

/// Payload delivered to listeners: `{"type":"update"|"error","message":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressMessage {
    Update { message: String },
    Error { message: String },
}

impl ProgressMessage {
    pub fn message(&self) -> &str {
        match self {
            ProgressMessage::Update { message } | ProgressMessage::Error { message } => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ProgressMessage::Error { .. })
    }
}

/// Topic a submitter's listeners subscribe to.
pub fn submission_topic(net_id: &str) -> String {
    format!("submissions/{net_id}")
}

/// Fire-and-forget progress reporting for one run.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<ProgressMessage>,
}

impl ProgressSink {
    /// A sink feeding the returned receiver directly, for callers that do
    /// their own delivery.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// A sink whose messages go nowhere.
    pub fn detached() -> Self {
        Self::channel().0
    }

    pub fn update(&self, message: impl Into<String>) {
        self.send(ProgressMessage::Update {
            message: message.into(),
        });
    }

    pub fn notify_error(&self, message: impl Into<String>) {
        self.send(ProgressMessage::Error {
            message: message.into(),
        });
    }

    fn send(&self, message: ProgressMessage) {
        if self.tx.send(message).is_err() {
            tracing::trace!("progress delivery task has stopped; message dropped");
        }
    }
}

/// Starts the delivery task for `net_id` and returns the sink feeding it.
///
/// The task ends once every clone of the sink has been dropped and the queue
/// is drained.
pub fn spawn_delivery(ws: WebSocketManager, net_id: &str) -> (ProgressSink, JoinHandle<()>) {
    let (sink, mut rx) = ProgressSink::channel();
    let topic = submission_topic(net_id);

    let handle = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            tracing::debug!(topic = %topic, error = message.is_error(), "{}", message.message());
            emit(&ws, &topic, &message).await;
        }
    });

    (sink, handle)
}
