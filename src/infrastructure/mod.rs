pub mod http;
pub mod services;

pub use http::HttpMarketDataBackend;
pub use services::{BrowserTimeProvider, ConsoleLogger, GlooTimer, WallClock, WasmSpawner, browser_runtime};
