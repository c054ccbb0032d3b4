//! Fire-and-forget telemetry.
//!
//! Sinks may fail; [`track`] swallows the failure after logging it at debug
//! level, so telemetry never affects the operation that emitted it.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// A named event with an arbitrary payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub data: Value,
}

impl TelemetryEvent {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Telemetry sink is closed")]
    Closed,
    #[error("Telemetry sink is full")]
    Full,
}

pub trait TelemetrySink: Send + Sync {
    fn send(&self, event: TelemetryEvent) -> Result<(), TelemetryError>;
}

/// Deliver `event`, ignoring delivery failures.
pub fn track(sink: &dyn TelemetrySink, event: TelemetryEvent) {
    let name = event.name.clone();
    if let Err(e) = sink.send(event) {
        tracing::debug!(event = %name, error = %e, "dropped telemetry event");
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn send(&self, _event: TelemetryEvent) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Writes events to the `tracing` log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn send(&self, event: TelemetryEvent) -> Result<(), TelemetryError> {
        tracing::info!(target: "covdash::telemetry", event = %event.name, data = %event.data, "telemetry");
        Ok(())
    }
}

/// Forwards events into a bounded channel without waiting.
#[derive(Debug, Clone)]
pub struct ChannelTelemetry {
    tx: mpsc::Sender<TelemetryEvent>,
}

impl ChannelTelemetry {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TelemetryEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelTelemetry {
    fn send(&self, event: TelemetryEvent) -> Result<(), TelemetryError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TelemetryError::Full,
            mpsc::error::TrySendError::Closed(_) => TelemetryError::Closed,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn channel_sink_delivers_events() {
        let (sink, mut rx) = ChannelTelemetry::new(2);
        track(&sink, TelemetryEvent::new("clicked", json!({ "button": "upgrade" })));
        let event = rx.recv().await.expect("event");
        assert_eq!(event.name, "clicked");
        assert_eq!(event.data, json!({ "button": "upgrade" }));
    }

    #[test]
    fn test_failures_are_ignored() {
        let (sink, rx) = ChannelTelemetry::new(1);
        track(&sink, TelemetryEvent::new("first", Value::Null));
        // Full: dropped without panicking.
        track(&sink, TelemetryEvent::new("second", Value::Null));
        drop(rx);
        // Closed: dropped without panicking.
        track(&sink, TelemetryEvent::new("third", Value::Null));
        assert!(sink.send(TelemetryEvent::new("fourth", Value::Null)).is_err());
    }
}
