//! Streaming aggregator: decoded frames in, observer notifications and a final value out.
//!
//! ```text
//! connecting --first chunk/stage--> streaming --end marker--> finalizing --> done
//!      |                               |
//!      +------- transport error -------+--> failed
//! ```

use crate::agent::{AgentClient, GenerationRequest, RawAgentResponse};
use crate::coerce::Coerced;
use crate::error::{ApiError, FailureReason, GenerationFault};
use crate::stream::frame::{FrameDecoder, LogicalFrame};
use crate::task::{settle, TaskOutcome};
use futures::StreamExt;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatorState {
    Connecting,
    Streaming,
    Finalizing,
    Done,
    Failed,
}

/// Per-request accumulation
#[derive(Debug, Default)]
pub struct StreamState {
    pub accumulated: String,
    pub decoder: FrameDecoder,
    pub last_stage: Option<String>,
}

/// What one decoded frame asks the aggregator to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStep {
    Stage(String),
    Chunk(String),
    End,
    Failed(String),
}

/// Synchronous core of the aggregator: bytes in, steps out.
#[derive(Debug)]
pub struct StreamMachine {
    state: AggregatorState,
    stream: StreamState,
}

impl Default for StreamMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamMachine {
    pub fn new() -> Self {
        Self {
            state: AggregatorState::Connecting,
            stream: StreamState::default(),
        }
    }

    pub fn state(&self) -> AggregatorState {
        self.state
    }

    pub fn accumulated(&self) -> &str {
        &self.stream.accumulated
    }

    pub fn into_accumulated(self) -> String {
        self.stream.accumulated
    }

    fn is_open(&self) -> bool {
        matches!(
            self.state,
            AggregatorState::Connecting | AggregatorState::Streaming
        )
    }

    /// Feed one read. Steps after an end marker or failure are not produced.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamStep> {
        let frames = self.stream.decoder.push(bytes);
        let mut steps = Vec::new();
        for frame in frames {
            if !self.is_open() {
                break;
            }
            if let Some(step) = self.apply(LogicalFrame::classify(&frame)) {
                steps.push(step);
            }
        }
        steps
    }

    /// The connection closed. A missing end marker fails the stream.
    pub fn finish(&mut self) -> Vec<StreamStep> {
        let mut steps = Vec::new();
        if !self.is_open() {
            return steps;
        }
        if let Some(frame) = self.stream.decoder.finish() {
            if let Some(step) = self.apply(LogicalFrame::classify(&frame)) {
                steps.push(step);
            }
        }
        if self.is_open() {
            steps.push(self.fail("stream closed before end marker".to_string()));
        }
        steps
    }

    /// A read error from the transport.
    pub fn transport_error(&mut self, message: String) -> StreamStep {
        self.fail(message)
    }

    /// Move to `done` once the final value has been forwarded.
    pub fn complete(&mut self) {
        if self.state == AggregatorState::Finalizing {
            self.state = AggregatorState::Done;
        }
    }

    fn fail(&mut self, message: String) -> StreamStep {
        self.state = AggregatorState::Failed;
        StreamStep::Failed(message)
    }

    fn apply(&mut self, frame: LogicalFrame) -> Option<StreamStep> {
        match frame {
            LogicalFrame::Ignored => None,
            LogicalFrame::Chunk(text) => {
                self.state = AggregatorState::Streaming;
                self.stream.accumulated.push_str(&text);
                Some(StreamStep::Chunk(text))
            }
            LogicalFrame::Stage(label) => {
                self.state = AggregatorState::Streaming;
                if self.stream.last_stage.as_deref() == Some(label.as_str()) {
                    return None;
                }
                self.stream.last_stage = Some(label.clone());
                Some(StreamStep::Stage(label))
            }
            LogicalFrame::End => {
                self.state = AggregatorState::Finalizing;
                Some(StreamStep::End)
            }
            LogicalFrame::Error(message) => Some(self.fail(message)),
        }
    }
}

/// Notification forwarded to a stream observer
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent<T> {
    Stage(String),
    Chunk { text: String, accumulated_len: usize },
    Final(T),
    Failed(FailureReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverSignal {
    Continue,
    Abandon,
}

/// Receives stream notifications; returning `Abandon` cancels the request.
pub trait StreamObserver<T>: Send {
    fn notify(&mut self, event: StreamEvent<T>) -> ObserverSignal;
}

impl<T, F> StreamObserver<T> for F
where
    F: FnMut(StreamEvent<T>) -> ObserverSignal + Send,
{
    fn notify(&mut self, event: StreamEvent<T>) -> ObserverSignal {
        self(event)
    }
}

/// Forwards notifications into a channel. A dropped receiver abandons the stream.
pub struct ChannelObserver<T> {
    sender: mpsc::UnboundedSender<StreamEvent<T>>,
}

impl<T> ChannelObserver<T> {
    pub fn new(sender: mpsc::UnboundedSender<StreamEvent<T>>) -> Self {
        Self { sender }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamEvent<T>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl<T: Send> StreamObserver<T> for ChannelObserver<T> {
    fn notify(&mut self, event: StreamEvent<T>) -> ObserverSignal {
        match self.sender.send(event) {
            Ok(()) => ObserverSignal::Continue,
            Err(_) => ObserverSignal::Abandon,
        }
    }
}

/// How a streamed request ended
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome<T> {
    /// End marker seen; the value is coerced (or a fallback if the text was unusable).
    Done(TaskOutcome<T>),
    /// Transport failure; the value is the fallback.
    Failed(TaskOutcome<T>),
    /// The observer walked away; the connection was dropped.
    Abandoned,
}

impl<T> StreamOutcome<T> {
    pub fn into_outcome(self) -> Option<TaskOutcome<T>> {
        match self {
            StreamOutcome::Done(outcome) | StreamOutcome::Failed(outcome) => Some(outcome),
            StreamOutcome::Abandoned => None,
        }
    }
}

/// Longest silence between two reads before the stream counts as broken.
pub const READ_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Streams one request to completion.
pub struct StreamingAggregator<'a> {
    client: &'a AgentClient,
    request: GenerationRequest,
    idle_timeout: Duration,
}

impl<'a> StreamingAggregator<'a> {
    pub fn new(client: &'a AgentClient, request: GenerationRequest) -> Self {
        Self {
            client,
            request,
            idle_timeout: READ_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub async fn run<T, O>(
        self,
        observer: &mut O,
        coerce: impl FnOnce(&str) -> Option<Coerced<T>>,
        fallback: impl FnOnce() -> T,
    ) -> StreamOutcome<T>
    where
        T: Clone,
        O: StreamObserver<T> + ?Sized,
    {
        let shape = self.request.shape();
        let idle_timeout = self.idle_timeout;
        let mut bytes = match self.client.open_stream(&self.request).await {
            Ok(bytes) => bytes,
            Err(reason) => return fail(observer, reason, fallback),
        };

        let mut machine = StreamMachine::new();
        loop {
            let next = match tokio::time::timeout(idle_timeout, bytes.next()).await {
                Ok(next) => next,
                Err(_) => {
                    let message = format!("no data for {} ms", idle_timeout.as_millis());
                    Some(Err(ApiError::ProviderRequestFailed(message)))
                }
            };
            let steps = match next {
                Some(Ok(read)) => machine.feed(&read),
                Some(Err(err)) => vec![machine.transport_error(err.to_string())],
                None => machine.finish(),
            };

            for step in steps {
                let event = match step {
                    StreamStep::Stage(label) => {
                        debug!(shape = %shape, stage = %label, "Stream stage");
                        StreamEvent::Stage(label)
                    }
                    StreamStep::Chunk(text) => StreamEvent::Chunk {
                        text,
                        accumulated_len: machine.accumulated().len(),
                    },
                    StreamStep::End => {
                        // Stop reading before coercing; the connection is released here.
                        drop(bytes);
                        let text = machine.accumulated().to_string();
                        let outcome = settle(shape, RawAgentResponse::text(text), coerce, fallback);
                        machine.complete();
                        if observer.notify(StreamEvent::Final(outcome.value.clone()))
                            == ObserverSignal::Abandon
                        {
                            debug!(shape = %shape, "Observer left after final value");
                        }
                        return StreamOutcome::Done(outcome);
                    }
                    StreamStep::Failed(message) => {
                        let reason = FailureReason::Transport { message };
                        return fail(observer, reason, fallback);
                    }
                };
                if observer.notify(event) == ObserverSignal::Abandon {
                    debug!(shape = %shape, "Stream abandoned by observer");
                    return StreamOutcome::Abandoned;
                }
            }
        }
    }
}

fn fail<T, O>(
    observer: &mut O,
    reason: FailureReason,
    fallback: impl FnOnce() -> T,
) -> StreamOutcome<T>
where
    O: StreamObserver<T> + ?Sized,
{
    let fault = match reason.fault() {
        GenerationFault::EmptyPayload => GenerationFault::TransportFailure,
        other => other,
    };
    warn!(fault = fault.as_str(), reason = %reason, "Stream failed; using fallback");
    observer.notify(StreamEvent::Failed(reason));
    StreamOutcome::Failed(TaskOutcome::fallback(fallback(), fault))
}
