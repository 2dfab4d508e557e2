#![allow(dead_code)]

pub use scriptrunner_test_utils::builders;
pub use scriptrunner_test_utils::stub;
pub use scriptrunner_test_utils::{init_tracing, with_timeout};

use std::time::Duration;

use scriptrunner::exec::{Origin, Supervisor, SupervisorOptions};
use scriptrunner::sink::LogSink;

/// A supervisor with short timeouts so failing tests fail fast.
pub fn supervisor() -> Supervisor {
    Supervisor::new(
        LogSink::new(),
        SupervisorOptions {
            cancel_grace: Duration::from_millis(500),
            drain_timeout: Duration::from_secs(1),
        },
    )
}

/// Texts of the entries from `origin`, in log order.
pub fn lines_from(sink: &LogSink, origin: Origin) -> Vec<String> {
    sink.entries()
        .into_iter()
        .filter(|l| l.origin == origin)
        .map(|l| l.text)
        .collect()
}

/// Poll until `pred` holds for the log, or panic after a few seconds.
pub async fn wait_for_log<F>(sink: &LogSink, pred: F)
where
    F: Fn(&[String]) -> bool,
{
    for _ in 0..200 {
        if pred(&sink.lines()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("log never matched; got {:?}", sink.lines());
}

/// Number of terminal status lines in the log.
pub fn terminal_lines(sink: &LogSink) -> usize {
    sink.lines()
        .iter()
        .filter(|l| {
            l.as_str() == "Script completed successfully."
                || l.as_str() == "Script cancelled."
                || l.starts_with("Script exited with error code:")
                || l.starts_with("Error running script:")
        })
        .count()
}
