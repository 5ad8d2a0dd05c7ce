//! Scheduling seams: wall clock, timers and the local task spawner.

use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{self, Either, LocalBoxFuture};
use futures::stream::LocalBoxStream;
use futures::task::LocalSpawn;

use crate::domain::errors::{DataFeedError, FeedResult};
use crate::domain::market_data::Timestamp;

/// Wall clock in epoch seconds
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Timer facilities of the hosting event loop
pub trait Timer {
    /// Yields once per `period`, first after one full period
    fn interval(&self, period: Duration) -> LocalBoxStream<'static, ()>;

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Everything the feed needs from its host to schedule work
#[derive(Clone)]
pub struct Runtime {
    pub clock: Rc<dyn Clock>,
    pub timer: Rc<dyn Timer>,
    pub spawner: Rc<dyn LocalSpawn>,
}

impl Runtime {
    pub fn new(clock: Rc<dyn Clock>, timer: Rc<dyn Timer>, spawner: Rc<dyn LocalSpawn>) -> Self {
        Self { clock, timer, spawner }
    }
}

/// Races `request` against `timer`; the request wins ties
pub async fn with_timeout<T, F>(timer: &dyn Timer, timeout: Duration, request: F) -> FeedResult<T>
where
    F: Future<Output = FeedResult<T>>,
{
    let request = pin!(request);
    match future::select(request, timer.sleep(timeout)).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => Err(DataFeedError::Timeout(timeout.as_millis() as u64)),
    }
}
