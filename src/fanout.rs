//! Fan-out/fan-in: run independent tasks concurrently, collect them in input order.
//!
//! Tasks never fail past their own boundary, so there is no short-circuiting: every
//! batch of N inputs settles to exactly N outputs, `result[i]` belonging to input `i`
//! whatever the completion order. Dropping the batch future drops every pending task.

use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Receives best-effort progress events. Implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event_type: &str, payload: Value);
}

/// Forwards progress events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn emit(&self, event_type: &str, payload: Value) {
        debug!(event_type, payload = %payload, "Progress event");
    }
}

/// Order-preserving concurrent executor
#[derive(Clone, Default)]
pub struct FanOutExecutor {
    progress: Option<Arc<dyn ProgressSink>>,
}

impl FanOutExecutor {
    pub fn new(progress: Option<Arc<dyn ProgressSink>>) -> Self {
        Self { progress }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run `tasks` concurrently. The output has the same length and order as the input.
    pub async fn run<F, T>(&self, batch: &str, tasks: Vec<F>) -> Vec<T>
    where
        F: Future<Output = T>,
    {
        let total = tasks.len();
        self.emit_event(
            "batch_started",
            json!({ "batch": batch, "total_count": total }),
        );

        let mut pending: FuturesUnordered<_> = tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| async move { (index, task.await) })
            .collect();

        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
        let mut settled = 0usize;
        while let Some((index, output)) = pending.next().await {
            settled += 1;
            slots[index] = Some(output);
            self.emit_event(
                "item_settled",
                json!({
                    "batch": batch,
                    "index": index,
                    "settled_count": settled,
                    "total_count": total,
                }),
            );
        }

        info!(batch, total, "Fan-out batch completed");
        self.emit_event(
            "batch_completed",
            json!({ "batch": batch, "total_count": total }),
        );

        // Every index is filled exactly once: the stream yields one item per task.
        slots.into_iter().flatten().collect()
    }

    fn emit_event(&self, event_type: &str, payload: Value) {
        if let Some(progress) = &self.progress {
            progress.emit(event_type, payload);
        }
    }
}
