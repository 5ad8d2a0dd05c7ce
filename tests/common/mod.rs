#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use chart_datafeed::application::{Clock, DataFeed, DataFeedConfig, FeedTuning, Runtime, Timer};
use chart_datafeed::domain::errors::{DataFeedError, FeedResult};
use chart_datafeed::domain::market_data::{
    HistoryRequest, MarketDataBackend, RawBarRow, ServerTime, SymbolRecord, Timestamp,
};
use futures::channel::{mpsc, oneshot};
use futures::executor::LocalPool;
use futures::future::{self, LocalBoxFuture};
use futures::stream::LocalBoxStream;
use futures::{FutureExt, StreamExt};
use serde_json::json;

pub const EXCHANGE: &str = "TESTEX";
pub const T0: i64 = 1_700_000_040;

/// One scripted answer to `fetch_ohlcv`
pub enum Reply {
    Rows(Vec<RawBarRow>),
    Fail(&'static str),
    Gated(oneshot::Receiver<Vec<RawBarRow>>),
    Hang,
}

pub enum TimeReply {
    Millis(i64),
    Fail,
    Hang,
}

/// Backend answering from a queue of scripted replies; an empty queue answers with no rows
pub struct MockBackend {
    replies: RefCell<VecDeque<Reply>>,
    requests: RefCell<Vec<HistoryRequest>>,
    server_time: RefCell<TimeReply>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            replies: RefCell::new(VecDeque::new()),
            requests: RefCell::new(Vec::new()),
            server_time: RefCell::new(TimeReply::Fail),
        }
    }

    pub fn push(&self, reply: Reply) {
        self.replies.borrow_mut().push_back(reply);
    }

    pub fn push_rows(&self, rows: Vec<RawBarRow>) {
        self.push(Reply::Rows(rows));
    }

    /// Queues a reply that resolves only when the returned sender fires
    pub fn push_gated(&self) -> oneshot::Sender<Vec<RawBarRow>> {
        let (tx, rx) = oneshot::channel();
        self.push(Reply::Gated(rx));
        tx
    }

    pub fn set_server_time(&self, reply: TimeReply) {
        *self.server_time.borrow_mut() = reply;
    }

    pub fn requests(&self) -> Vec<HistoryRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl MarketDataBackend for MockBackend {
    fn fetch_ohlcv<'a>(
        &'a self,
        request: &'a HistoryRequest,
    ) -> LocalBoxFuture<'a, FeedResult<Vec<RawBarRow>>> {
        self.requests.borrow_mut().push(request.clone());
        let reply = self.replies.borrow_mut().pop_front();
        async move {
            match reply {
                None => Ok(Vec::new()),
                Some(Reply::Rows(rows)) => Ok(rows),
                Some(Reply::Fail(reason)) => Err(DataFeedError::Fetch(reason.to_string())),
                Some(Reply::Gated(rx)) => {
                    rx.await.map_err(|_| DataFeedError::Fetch("gate dropped".to_string()))
                }
                Some(Reply::Hang) => future::pending().await,
            }
        }
        .boxed_local()
    }

    fn fetch_server_time(&self) -> LocalBoxFuture<'_, FeedResult<ServerTime>> {
        let reply = match &*self.server_time.borrow() {
            TimeReply::Millis(millis) => Some(Ok(ServerTime { server_time_millis: *millis })),
            TimeReply::Fail => Some(Err(DataFeedError::Fetch("HTTP error: 503".to_string()))),
            TimeReply::Hang => None,
        };
        match reply {
            Some(result) => future::ready(result).boxed_local(),
            None => future::pending().boxed_local(),
        }
    }
}

/// Timer driven by the test: intervals tick on `tick()`, sleeps never finish unless expired
#[derive(Default)]
pub struct ManualTimer {
    intervals: RefCell<Vec<mpsc::UnboundedSender<()>>>,
    expire_timeouts: Cell<bool>,
}

impl ManualTimer {
    pub fn tick(&self) {
        self.intervals.borrow_mut().retain(|tx| tx.unbounded_send(()).is_ok());
    }

    pub fn expire_timeouts(&self) {
        self.expire_timeouts.set(true);
    }

    pub fn live_intervals(&self) -> usize {
        self.intervals.borrow_mut().retain(|tx| !tx.is_closed());
        self.intervals.borrow().len()
    }
}

impl Timer for ManualTimer {
    fn interval(&self, _period: Duration) -> LocalBoxStream<'static, ()> {
        let (tx, rx) = mpsc::unbounded();
        self.intervals.borrow_mut().push(tx);
        rx.boxed_local()
    }

    fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
        if self.expire_timeouts.get() {
            future::ready(()).boxed_local()
        } else {
            future::pending().boxed_local()
        }
    }
}

pub struct FixedClock(Cell<Timestamp>);

impl FixedClock {
    pub fn new(secs: i64) -> Self {
        Self(Cell::new(Timestamp::from_secs(secs)))
    }

    pub fn set(&self, secs: i64) {
        self.0.set(Timestamp::from_secs(secs));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0.get()
    }
}

pub fn btc_usdt() -> SymbolRecord {
    SymbolRecord::new("BTC/USDT", "BTC", "USDT").with_precision(2, 6).with_price_limits(0.01, None)
}

pub fn eth_btc() -> SymbolRecord {
    SymbolRecord::new("ETH/BTC", "ETH", "BTC").with_precision(6, 4)
}

pub fn eth_usdt() -> SymbolRecord {
    SymbolRecord::new("ETH/USDT", "ETH", "USDT").with_precision(2, 4)
}

pub fn config() -> DataFeedConfig {
    DataFeedConfig::new(EXCHANGE, vec![btc_usdt(), eth_usdt(), eth_btc()], "secret-token")
}

/// Backend row at `secs` with prices as numeric strings, the way the exchange sends them
pub fn row(secs: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> RawBarRow {
    RawBarRow(vec![
        json!(secs * 1000),
        json!(open.to_string()),
        json!(high.to_string()),
        json!(low.to_string()),
        json!(close.to_string()),
        json!(volume),
    ])
}

/// Flat candle at `secs` closing at `close`
pub fn flat_row(secs: i64, close: f64) -> RawBarRow {
    row(secs, close, close, close, close, 1.0)
}

pub struct Harness {
    pub pool: LocalPool,
    pub backend: Rc<MockBackend>,
    pub clock: Rc<FixedClock>,
    pub timer: Rc<ManualTimer>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            pool: LocalPool::new(),
            backend: Rc::new(MockBackend::new()),
            clock: Rc::new(FixedClock::new(T0 + 600)),
            timer: Rc::new(ManualTimer::default()),
        }
    }

    pub fn runtime(&self) -> Runtime {
        Runtime::new(self.clock.clone(), self.timer.clone(), Rc::new(self.pool.spawner()))
    }

    pub fn feed(&self) -> DataFeed<MockBackend> {
        self.feed_with(FeedTuning::default())
    }

    pub fn feed_with(&self, tuning: FeedTuning) -> DataFeed<MockBackend> {
        DataFeed::new(config().with_tuning(tuning), Rc::clone(&self.backend), self.runtime())
            .expect("valid test config")
    }

    /// Runs spawned tasks until none can make progress
    pub fn settle(&mut self) {
        self.pool.run_until_stalled();
    }
}
