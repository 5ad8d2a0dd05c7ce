use std::rc::Rc;
use std::time::Duration;

use crate::application::runtime::{Clock, Timer, with_timeout};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{MarketDataBackend, Timestamp};
use crate::{log_debug, log_warn};

const COMPONENT: LogComponent = LogComponent::Application("ServerTime");

/// Server clock for axis alignment, falling back to the local clock
pub struct ServerTimeService<B> {
    backend: Rc<B>,
    clock: Rc<dyn Clock>,
    timer: Rc<dyn Timer>,
    timeout: Duration,
}

impl<B: MarketDataBackend> ServerTimeService<B> {
    pub fn new(backend: Rc<B>, clock: Rc<dyn Clock>, timer: Rc<dyn Timer>, timeout: Duration) -> Self {
        Self { backend, clock, timer, timeout }
    }

    /// Single attempt; never fails
    pub async fn server_time(&self) -> Timestamp {
        let reading =
            with_timeout(self.timer.as_ref(), self.timeout, self.backend.fetch_server_time()).await;

        match reading {
            Ok(time) if time.server_time_millis > 0 => {
                let server = Timestamp::from_millis(time.server_time_millis);
                log_debug!(COMPONENT, "Server time {}", server);
                server
            }
            Ok(time) => {
                let local = self.clock.now();
                log_warn!(
                    COMPONENT,
                    "Implausible server time {} ms, using local clock {}",
                    time.server_time_millis,
                    local
                );
                local
            }
            Err(e) => {
                let local = self.clock.now();
                log_warn!(COMPONENT, "Server time unavailable ({}), using local clock {}", e, local);
                local
            }
        }
    }
}
