use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestEnd {
    Expired,
    Skipped,
}

/// Whole-second countdown. Pure value, driven by [`RestTimer`] or by hand in tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestCountdown {
    pub target_secs: u32,
    pub remaining_secs: u32,
    pub ended: Option<RestEnd>,
}

impl RestCountdown {
    pub fn new(target_secs: u32) -> Self {
        Self {
            target_secs,
            remaining_secs: target_secs,
            ended: None,
        }
    }

    /// One-second step. Returns `Some(Expired)` only on the tick that reaches zero.
    pub fn tick(&mut self) -> Option<RestEnd> {
        if self.ended.is_some() {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.ended = Some(RestEnd::Expired);
            return self.ended;
        }
        None
    }

    /// Ends the countdown early. Returns `None` if it had already ended.
    pub fn skip(&mut self) -> Option<RestEnd> {
        if self.ended.is_some() {
            return None;
        }
        self.ended = Some(RestEnd::Skipped);
        self.ended
    }

    pub fn is_finished(&self) -> bool {
        self.ended.is_some()
    }

    pub fn fraction(&self) -> f64 {
        if self.target_secs == 0 {
            return 0.0;
        }
        f64::from(self.remaining_secs) / f64::from(self.target_secs)
    }
}

/// Ticking countdown published over a watch channel.
///
/// The ticker task is aborted on skip, on [`RestTimer::cancel`] and on drop,
/// so replacing a timer never leaves a stray task behind. Cancel does not
/// publish an end signal; subscribers see the channel close instead.
pub struct RestTimer {
    state: Arc<watch::Sender<RestCountdown>>,
    ticker: JoinHandle<()>,
}

impl RestTimer {
    pub fn start(target_secs: u32, tick: Duration) -> Self {
        let (sender, _) = watch::channel(RestCountdown::new(target_secs));
        let state = Arc::new(sender);

        let ticker_state = Arc::clone(&state);
        let ticker = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + tick, tick);
            loop {
                interval.tick().await;
                ticker_state.send_modify(|countdown| {
                    if let Some(end) = countdown.tick() {
                        tracing::debug!(?end, "Rest countdown ended");
                    }
                });
                if ticker_state.borrow().is_finished() {
                    break;
                }
            }
        });

        Self { state, ticker }
    }

    /// Returns `true` if this call ended the countdown.
    pub fn skip(&self) -> bool {
        self.ticker.abort();
        let mut skipped = false;
        self.state.send_if_modified(|countdown| {
            skipped = countdown.skip().is_some();
            skipped
        });
        skipped
    }

    pub fn cancel(self) {
        self.ticker.abort();
    }

    pub fn subscribe(&self) -> watch::Receiver<RestCountdown> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> RestCountdown {
        *self.state.borrow()
    }
}

impl Drop for RestTimer {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_expires_exactly_once_after_target_ticks() {
        let mut countdown = RestCountdown::new(10);
        let ends: Vec<RestEnd> = (0..12).filter_map(|_| countdown.tick()).collect();

        assert_eq!(ends, vec![RestEnd::Expired]);
        assert_eq!(countdown.remaining_secs, 0);
    }

    #[test]
    fn skip_after_expiry_is_ignored() {
        let mut countdown = RestCountdown::new(1);
        assert_eq!(countdown.tick(), Some(RestEnd::Expired));
        assert_eq!(countdown.skip(), None);
    }

    #[test]
    fn fraction_falls_from_one_to_zero() {
        let mut countdown = RestCountdown::new(4);
        let mut fractions = vec![countdown.fraction()];
        while !countdown.is_finished() {
            countdown.tick();
            fractions.push(countdown.fraction());
        }
        assert_eq!(fractions, vec![1.0, 0.75, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn zero_target_has_zero_fraction() {
        assert_eq!(RestCountdown::new(0).fraction(), 0.0);
    }
}
