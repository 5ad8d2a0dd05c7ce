use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{AbortHandle, abortable};
use futures::stream::LocalBoxStream;
use futures::task::LocalSpawnExt;
use futures::{FutureExt, StreamExt};

use crate::application::history::HistoricalBarRetriever;
use crate::application::runtime::Runtime;
use crate::domain::errors::{DataFeedError, FeedResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Bar, BarRange, MarketDataBackend, Resolution, SymbolRecord, Timestamp};
use crate::{log_debug, log_error, log_info, log_trace, log_warn};

const COMPONENT: LogComponent = LogComponent::Application("Poller");

/// Steps of history a tick looks back when no session anchor exists yet
const FALLBACK_LOOKBACK_STEPS: u64 = 2;

/// Opaque token for one live subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

struct ActiveSubscription {
    abort: AbortHandle,
    subscribed: Rc<Cell<bool>>,
}

/// Shared start of the refresh window, recorded by the first history request
pub type SessionAnchor = Rc<Cell<Option<Timestamp>>>;

struct PollTask<B> {
    retriever: Rc<HistoricalBarRetriever<B>>,
    runtime: Runtime,
    anchor: SessionAnchor,
    symbol: SymbolRecord,
    resolution: Resolution,
    period: Duration,
    subscribed: Rc<Cell<bool>>,
}

impl<B: MarketDataBackend> PollTask<B> {
    async fn run<F>(self, mut on_bar: F)
    where
        F: FnMut(Bar),
    {
        let mut ticks = self.runtime.timer.interval(self.period);
        while ticks.next().await.is_some() {
            if !self.subscribed.get() {
                break;
            }

            let window = self.window();
            log_trace!(COMPONENT, "Tick for {} over [{}, {})", self.symbol.symbol, window.from, window.to);
            match self.retriever.fetch_latest(&self.symbol, self.resolution, window).await {
                Ok(Some(latest)) if self.subscribed.get() => on_bar(latest),
                Ok(Some(_)) => break,
                Ok(None) => {
                    log_debug!(COMPONENT, "No bars for {} in tick window", self.symbol.symbol);
                }
                Err(e) if e.is_fetch_failure() => {
                    log_warn!(COMPONENT, "Tick for {} failed, retrying next tick: {}", self.symbol.symbol, e);
                }
                Err(e) => {
                    log_error!(COMPONENT, "Tick for {} failed: {}", self.symbol.symbol, e);
                }
            }

            let skipped = drain_ready_ticks(&mut ticks);
            if skipped > 0 {
                log_debug!(COMPONENT, "Skipped {} tick(s) while a fetch was in flight", skipped);
            }
        }
    }

    fn window(&self) -> BarRange {
        let now = self.runtime.clock.now();
        let from = self.anchor.get().unwrap_or_else(|| {
            now.saturating_sub_millis(self.resolution.duration_ms() * FALLBACK_LOOKBACK_STEPS)
        });
        BarRange::new(from, now)
    }
}

/// Ticks already queued are dropped so at most one fetch runs per period
fn drain_ready_ticks(ticks: &mut LocalBoxStream<'static, ()>) -> usize {
    let mut skipped = 0;
    while let Some(Some(())) = ticks.next().now_or_never() {
        skipped += 1;
    }
    skipped
}

/// Simulates a push feed by re-fetching the newest bar on a fixed period
pub struct RealtimePoller<B> {
    retriever: Rc<HistoricalBarRetriever<B>>,
    runtime: Runtime,
    anchor: SessionAnchor,
    period: Duration,
    next_id: Cell<u64>,
    active: RefCell<HashMap<SubscriptionHandle, ActiveSubscription>>,
}

impl<B: MarketDataBackend + 'static> RealtimePoller<B> {
    pub fn new(
        retriever: Rc<HistoricalBarRetriever<B>>,
        runtime: Runtime,
        anchor: SessionAnchor,
        period: Duration,
    ) -> Self {
        Self {
            retriever,
            runtime,
            anchor,
            period,
            next_id: Cell::new(1),
            active: RefCell::new(HashMap::new()),
        }
    }

    /// Idle -> Polling: starts the repeating task and hands back its handle
    pub fn subscribe<F>(
        &self,
        symbol: &SymbolRecord,
        resolution: Resolution,
        on_bar: F,
    ) -> FeedResult<SubscriptionHandle>
    where
        F: FnMut(Bar) + 'static,
    {
        let handle = SubscriptionHandle(self.next_id.get());
        self.next_id.set(handle.0 + 1);

        let subscribed = Rc::new(Cell::new(true));
        let task = PollTask {
            retriever: Rc::clone(&self.retriever),
            runtime: self.runtime.clone(),
            anchor: Rc::clone(&self.anchor),
            symbol: symbol.clone(),
            resolution,
            period: self.period,
            subscribed: Rc::clone(&subscribed),
        };

        let (polling, abort) = abortable(task.run(on_bar));
        self.runtime
            .spawner
            .spawn_local(polling.map(|_| ()))
            .map_err(|e| DataFeedError::Spawn(format!("{e:?}")))?;

        self.active.borrow_mut().insert(handle, ActiveSubscription { abort, subscribed });
        log_info!(
            COMPONENT,
            "Subscription {} started for {} @ {} every {:?}",
            handle.0,
            symbol.symbol,
            resolution,
            self.period
        );
        Ok(handle)
    }

    /// Polling -> Idle. No further bars are delivered once this returns; unknown handles are ignored.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        let Some(subscription) = self.active.borrow_mut().remove(&handle) else {
            log_debug!(COMPONENT, "Subscription {} already idle", handle.0);
            return;
        };
        subscription.subscribed.set(false);
        subscription.abort.abort();
        log_info!(COMPONENT, "Subscription {} stopped", handle.0);
    }

    pub fn is_subscribed(&self, handle: SubscriptionHandle) -> bool {
        self.active.borrow().contains_key(&handle)
    }

    pub fn active_count(&self) -> usize {
        self.active.borrow().len()
    }
}

impl<B> Drop for RealtimePoller<B> {
    fn drop(&mut self) {
        for (_, subscription) in self.active.get_mut().drain() {
            subscription.subscribed.set(false);
            subscription.abort.abort();
        }
    }
}
