mod common;

use std::rc::Rc;

use chart_datafeed::application::{DataFeed, DataFeedConfig, FeedTuning};
use chart_datafeed::domain::errors::DataFeedError;
use common::{Harness, btc_usdt, config};
use insta::assert_json_snapshot;

#[test]
fn ready_payload_lists_exchange_and_resolutions() {
    let harness = Harness::new();
    let capabilities = harness.feed().capabilities();

    assert_json_snapshot!(capabilities, @r###"
    {
      "supports_marks": false,
      "supports_timescale_marks": false,
      "supports_time": true,
      "supported_resolutions": [
        "1",
        "3",
        "5",
        "15",
        "30",
        "60",
        "120",
        "240",
        "1D",
        "1W",
        "1M"
      ],
      "exchanges": [
        {
          "value": "TESTEX",
          "name": "TESTEX",
          "desc": "TESTEX"
        }
      ]
    }
    "###);
}

#[test]
fn capabilities_do_not_touch_the_backend() {
    let harness = Harness::new();
    let feed = harness.feed();
    let _ = feed.capabilities();
    let _ = feed.capabilities();

    assert_eq!(harness.backend.request_count(), 0);
}

fn build(config: DataFeedConfig) -> Option<DataFeedError> {
    let harness = Harness::new();
    DataFeed::new(config, Rc::clone(&harness.backend), harness.runtime()).err()
}

#[test]
fn construction_rejects_invalid_config() {
    assert_eq!(
        build(DataFeedConfig::new("EX", vec![btc_usdt(), btc_usdt()], "")),
        Some(DataFeedError::InvalidConfig("duplicate ticker in symbol catalog: BTC/USDT".to_string()))
    );
    assert!(matches!(
        build(DataFeedConfig::new("  ", vec![btc_usdt()], "")),
        Some(DataFeedError::InvalidConfig(_))
    ));
    assert!(matches!(
        build(config().with_tuning(FeedTuning { poll_interval_ms: 0, ..FeedTuning::default() })),
        Some(DataFeedError::InvalidConfig(_))
    ));
    assert!(build(config()).is_none());
}

#[test]
fn resolution_strings_round_trip_through_the_feed() {
    let harness = Harness::new();
    let feed = harness.feed();

    for resolution in feed.capabilities().supported_resolutions {
        let symbol = feed.resolve_symbol("BTC/USDT").unwrap();
        assert!(symbol.supported_resolutions.contains(&resolution));
        assert!(chart_datafeed::Resolution::parse(&resolution).is_ok());
    }
    assert!(chart_datafeed::Resolution::parse("D").is_ok());
    assert_eq!(
        chart_datafeed::Resolution::parse("2"),
        Err(DataFeedError::UnsupportedResolution("2".to_string()))
    );
}
