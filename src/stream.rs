//! Streaming delivery: incremental agent output re-assembled into a final value.
//!
//! [`frame`] splits raw bytes into server-sent events; [`aggregator`] drives the
//! per-request state machine and forwards notifications to a [`StreamObserver`].

pub mod aggregator;
pub mod frame;

pub use aggregator::{
    AggregatorState, ChannelObserver, ObserverSignal, StreamEvent, StreamMachine, StreamObserver,
    StreamOutcome, StreamState, StreamStep, StreamingAggregator,
};
pub use frame::{FrameDecoder, LogicalFrame, RawFrame};
