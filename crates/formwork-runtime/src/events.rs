#![forbid(unsafe_code)]

//! Per-control value and status streams.
//!
//! Streams are multicast and replay nothing: a subscriber sees only the
//! events emitted after it subscribed. Each subscriber buffers up to the
//! tree's configured event capacity; one that falls further behind skips
//! the oldest events and continues with the newest.

use formwork_core::{ControlStatus, FormValue};
use futures_util::Stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// The two streams every control publishes on.
#[derive(Debug)]
pub(crate) struct EventChannels {
    values: broadcast::Sender<FormValue>,
    statuses: broadcast::Sender<ControlStatus>,
}

impl EventChannels {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (values, _) = broadcast::channel(capacity);
        let (statuses, _) = broadcast::channel(capacity);
        Self { values, statuses }
    }

    pub(crate) fn emit(&self, value: &FormValue, status: ControlStatus) {
        self.emit_value(value);
        self.emit_status(status);
    }

    pub(crate) fn emit_value(&self, value: &FormValue) {
        // Sending only fails when nobody listens
        if self.values.receiver_count() > 0 {
            let _ = self.values.send(value.clone());
        }
    }

    pub(crate) fn emit_status(&self, status: ControlStatus) {
        let _ = self.statuses.send(status);
    }

    pub(crate) fn subscribe_values(&self) -> EventStream<FormValue> {
        EventStream::new(self.values.subscribe())
    }

    pub(crate) fn subscribe_statuses(&self) -> EventStream<ControlStatus> {
        EventStream::new(self.statuses.subscribe())
    }
}

/// A subscription to one of a control's streams.
///
/// The stream ends (`recv` returns `None`) once the control is dropped
/// from its tree.
#[derive(Debug)]
pub struct EventStream<T> {
    rx: broadcast::Receiver<T>,
}

impl<T: Clone> EventStream<T> {
    fn new(rx: broadcast::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged, skipping missed events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event if one is already buffered.
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged, skipping missed events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Take every event that is already buffered.
    pub fn drain(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl<T: Clone + Send + 'static> EventStream<T> {
    /// Adapt the subscription into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = T> + Send {
        futures_util::stream::unfold(self, |mut events| async move {
            let event = events.recv().await?;
            Some((event, events))
        })
    }
}
