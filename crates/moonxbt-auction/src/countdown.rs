use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::data::format_time_left;

const TICK: Duration = Duration::from_secs(1);

/// Local `HH:MM:SS` countdown between chain reads.
///
/// Seeded with the on-chain seconds and decremented once per second until it
/// reaches `00:00:00`. It is not re-anchored to chain time, so it is for display
/// only. Seeding again replaces the running ticker.
pub struct Countdown {
    display: Arc<watch::Sender<String>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    pub fn new() -> Self {
        let (display, _) = watch::channel(format_time_left(0));
        Self {
            display: Arc::new(display),
            ticker: Mutex::new(None),
        }
    }

    fn ticker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed(&self, seconds: u64) {
        let mut ticker = self.ticker();
        if let Some(previous) = ticker.take() {
            previous.abort();
        }
        self.display.send_replace(format_time_left(seconds));
        if seconds == 0 {
            return;
        }

        let display = Arc::clone(&self.display);
        *ticker = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut remaining = seconds;
            while remaining > 0 {
                interval.tick().await;
                remaining -= 1;
                display.send_replace(format_time_left(remaining));
            }
        }));
    }

    /// Current display value.
    pub fn current(&self) -> String {
        self.display.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.display.subscribe()
    }

    pub fn stop(&self) {
        if let Some(ticker) = self.ticker().take() {
            ticker.abort();
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counts_down_to_zero_and_stops() {
        let countdown = Countdown::new();
        countdown.seed(10);
        assert_eq!(countdown.current(), "00:00:10");

        tokio::time::sleep(Duration::from_millis(500)).await;
        for expected in (0..10u64).rev() {
            tokio::time::sleep(TICK).await;
            assert_eq!(countdown.current(), format_time_left(expected));
        }
        assert_eq!(countdown.current(), "00:00:00");

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(countdown.current(), "00:00:00");
    }

    #[tokio::test(start_paused = true)]
    async fn reseeding_replaces_ticker() {
        let countdown = Countdown::new();
        countdown.seed(100);
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(countdown.current(), "00:01:38");

        countdown.seed(5);
        assert_eq!(countdown.current(), "00:00:05");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(countdown.current(), "00:00:04");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_seed_does_not_tick() {
        let countdown = Countdown::new();
        countdown.seed(0);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(countdown.current(), "00:00:00");
    }
}
