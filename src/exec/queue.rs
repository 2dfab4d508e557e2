// src/exec/queue.rs

//! The per-run line queue shared by the pumps and the log forwarder.

use std::fmt;

use tokio::sync::mpsc;

/// Where a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Stdout,
    Stderr,
    /// Produced by the launcher itself (status lines, input echo, errors).
    System,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Stdout => "stdout",
            Origin::Stderr => "stderr",
            Origin::System => "system",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of log output. Ordering is arrival order at the queue only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub origin: Origin,
    pub text: String,
}

impl LogLine {
    pub fn new(origin: Origin, text: impl Into<String>) -> Self {
        Self {
            origin,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Origin::System, text)
    }
}

pub type LineSender = mpsc::UnboundedSender<LogLine>;
pub type LineReceiver = mpsc::UnboundedReceiver<LogLine>;

/// Create a fresh queue for one run.
pub fn line_queue() -> (LineSender, LineReceiver) {
    mpsc::unbounded_channel()
}

/// Take every line that is available right now, without waiting.
///
/// Returns an empty vec when the queue is momentarily empty or closed.
pub fn drain_available(rx: &mut LineReceiver) -> Vec<LogLine> {
    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_lines_in_arrival_order() {
        let (tx, mut rx) = line_queue();
        tx.send(LogLine::new(Origin::Stdout, "one")).unwrap();
        tx.send(LogLine::new(Origin::Stderr, "two")).unwrap();
        tx.send(LogLine::system("three")).unwrap();

        let texts: Vec<String> = drain_available(&mut rx).into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert!(drain_available(&mut rx).is_empty());
    }

    #[test]
    fn drain_on_closed_queue_is_empty_not_an_error() {
        let (tx, mut rx) = line_queue();
        tx.send(LogLine::system("last")).unwrap();
        drop(tx);

        assert_eq!(drain_available(&mut rx).len(), 1);
        assert!(drain_available(&mut rx).is_empty());
    }
}
