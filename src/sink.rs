// src/sink.rs

//! The log view: an ordered, append-only record of one job's output.
//!
//! Producers never touch the sink directly while a job runs; they push onto
//! the job's line queue and a forwarder task moves lines over in arrival
//! order. Readers either poll (`lines`, `lines_since`, `is_busy`) or
//! `subscribe` to [`LogEvent`]s.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::exec::queue::{LineReceiver, LogLine, drain_available};

const EVENT_CAPACITY: usize = 1024;

/// Change notifications for subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// Prior content was discarded because a new job started.
    Reset,
    Line(LogLine),
    /// The in-progress indicator turned on or off.
    Busy(bool),
}

#[derive(Debug, Default)]
struct SinkState {
    lines: Vec<LogLine>,
    busy: bool,
}

#[derive(Debug, Clone)]
pub struct LogSink {
    state: Arc<Mutex<SinkState>>,
    events: broadcast::Sender<LogEvent>,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(SinkState::default())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop all content; the log now belongs to a new job.
    pub fn reset(&self) {
        self.lock().lines.clear();
        let _ = self.events.send(LogEvent::Reset);
    }

    pub fn append(&self, line: LogLine) {
        self.append_batch(vec![line]);
    }

    pub fn append_system(&self, text: impl Into<String>) {
        self.append(LogLine::system(text));
    }

    /// Append lines in the given order, under one lock.
    pub fn append_batch(&self, lines: Vec<LogLine>) {
        if lines.is_empty() {
            return;
        }
        let mut state = self.lock();
        for line in lines {
            trace!(stream = %line.origin, text = %line.text, "log line");
            state.lines.push(line.clone());
            let _ = self.events.send(LogEvent::Line(line));
        }
    }

    pub fn set_busy(&self, busy: bool) {
        let mut state = self.lock();
        if state.busy != busy {
            state.busy = busy;
            let _ = self.events.send(LogEvent::Busy(busy));
        }
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    /// Snapshot of every line's text.
    pub fn lines(&self) -> Vec<String> {
        self.lock().lines.iter().map(|l| l.text.clone()).collect()
    }

    pub fn entries(&self) -> Vec<LogLine> {
        self.lock().lines.clone()
    }

    /// Entries from index `cursor` onward, for incremental rendering.
    pub fn lines_since(&self, cursor: usize) -> Vec<LogLine> {
        let state = self.lock();
        state.lines.get(cursor..).map(<[LogLine]>::to_vec).unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.lock().lines.last().map(|l| l.text.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.events.subscribe()
    }

    /// Move lines from a job's queue into the sink until every producer has
    /// dropped its sender.
    ///
    /// Blocks on the first available line, then takes everything else that is
    /// already queued without waiting, so a burst lands as one batch. The
    /// returned handle resolves to the total number of lines forwarded, after
    /// the final drain.
    pub fn spawn_forwarder(&self, mut rx: LineReceiver) -> JoinHandle<usize> {
        let sink = self.clone();
        tokio::spawn(async move {
            let mut forwarded = 0usize;
            while let Some(first) = rx.recv().await {
                let mut batch = vec![first];
                batch.extend(drain_available(&mut rx));
                forwarded += batch.len();
                sink.append_batch(batch);
            }
            forwarded
        })
    }
}
