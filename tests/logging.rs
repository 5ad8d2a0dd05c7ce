mod common;

use std::sync::Mutex;

use chart_datafeed::domain::logging::{LogEntry, LogLevel, Logger, init_logger};
use chart_datafeed::domain::market_data::{BarRange, RawBarRow, Resolution, Timestamp};
use common::{Harness, Reply, T0, btc_usdt, flat_row};
use futures::executor::block_on;
use serde_json::json;

static ENTRIES: Mutex<Vec<LogEntry>> = Mutex::new(Vec::new());

struct CapturingLogger;

impl Logger for CapturingLogger {
    fn log(&self, entry: LogEntry) {
        ENTRIES.lock().unwrap().push(entry);
    }
}

fn captured(needle: &str) -> Vec<LogEntry> {
    init_logger(Box::new(CapturingLogger));
    ENTRIES.lock().unwrap().iter().filter(|entry| entry.message.contains(needle)).cloned().collect()
}

#[test]
fn rejected_rows_are_warned_with_counts() {
    init_logger(Box::new(CapturingLogger));
    let harness = Harness::new();
    harness.backend.push_rows(vec![flat_row(T0, 1.0), RawBarRow(vec![json!(T0 * 1000), json!("x")])]);
    let feed = harness.feed();
    let range = BarRange::new(Timestamp::from_secs(T0), Timestamp::from_secs(T0 + 600));

    block_on(feed.get_bars(&btc_usdt(), Resolution::OneMinute, range, false)).unwrap();

    let entries = captured("could not be normalized");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Warn);
    assert_eq!(entries[0].metadata.as_deref(), Some("rejected=1 received=2"));
}

#[test]
fn failed_poll_tick_is_a_warning() {
    init_logger(Box::new(CapturingLogger));
    let mut harness = Harness::new();
    let feed = harness.feed();
    feed.subscribe(&btc_usdt(), Resolution::OneMinute, |_| {}).unwrap();
    harness.settle();
    harness.backend.push(Reply::Fail("HTTP error: 504"));
    harness.timer.tick();
    harness.settle();

    let entries = captured("HTTP error: 504");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Warn);
    assert!(entries[0].message.contains("retrying next tick"));
}
