//! Browser implementations of the logging and scheduling seams.

use std::rc::Rc;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use futures::{FutureExt, StreamExt};
use gloo_timers::future::{IntervalStream, TimeoutFuture};

use crate::application::runtime::{Clock, Runtime, Timer};
use crate::domain::logging::{LogEntry, LogLevel, Logger, TimeProvider, get_time_provider};
use crate::domain::market_data::Timestamp;

/// Logger that writes to the browser console
pub struct ConsoleLogger {
    min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    pub fn new_development() -> Self {
        Self::new(LogLevel::Debug)
    }

    pub fn new_production() -> Self {
        Self::new(LogLevel::Warn)
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }
        let line = entry.render(&get_time_provider().format_timestamp(entry.timestamp));
        match entry.level {
            LogLevel::Trace | LogLevel::Debug => gloo::console::debug!(line),
            LogLevel::Info => gloo::console::info!(line),
            LogLevel::Warn => gloo::console::warn!(line),
            LogLevel::Error => gloo::console::error!(line),
        }
    }
}

/// Log timestamps from `Date.now()`
pub struct BrowserTimeProvider;

impl BrowserTimeProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BrowserTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for BrowserTimeProvider {
    fn current_timestamp(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    fn format_timestamp(&self, timestamp: u64) -> String {
        let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(timestamp as f64));
        format!(
            "{:02}:{:02}:{:02}.{:03}",
            date.get_utc_hours(),
            date.get_utc_minutes(),
            date.get_utc_seconds(),
            date.get_utc_milliseconds()
        )
    }
}

/// Wall clock: `Date.now()` in the browser, the system clock elsewhere
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

impl Clock for WallClock {
    #[cfg(target_arch = "wasm32")]
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(js_sys::Date::now() as i64)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now(&self) -> Timestamp {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or_default();
        Timestamp::from_millis(millis)
    }
}

/// Event-loop timers via gloo
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTimer;

/// Browsers fire `setTimeout` immediately for delays above `i32::MAX` ms
const MAX_TIMER_MILLIS: u32 = i32::MAX as u32;

fn clamp_millis(duration: Duration) -> u32 {
    duration.as_millis().min(u128::from(MAX_TIMER_MILLIS)) as u32
}

impl Timer for GlooTimer {
    fn interval(&self, period: Duration) -> LocalBoxStream<'static, ()> {
        IntervalStream::new(clamp_millis(period)).boxed_local()
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        TimeoutFuture::new(clamp_millis(duration)).boxed_local()
    }
}

/// Spawns onto the browser microtask queue
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmSpawner;

impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

pub fn browser_runtime() -> Runtime {
    Runtime::new(Rc::new(WallClock), Rc::new(GlooTimer), Rc::new(WasmSpawner))
}
