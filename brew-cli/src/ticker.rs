use std::time::Duration;

use brew_core::{BrewMethod, TickGuard, TickScheduler};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// One elapsed second for the timer tagged `(method, generation)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    pub method: BrewMethod,
    pub generation: u64,
}

/// Spawns one interval task per running timer. The task is aborted when its
/// guard drops; anything it already queued is filtered by generation.
pub struct TokioTicker {
    tx: UnboundedSender<TickEvent>,
    period: Duration,
}

impl TokioTicker {
    pub fn new(tx: UnboundedSender<TickEvent>) -> Self {
        Self::with_period(tx, Duration::from_secs(1))
    }

    pub fn with_period(tx: UnboundedSender<TickEvent>, period: Duration) -> Self {
        Self { tx, period }
    }
}

impl TickScheduler for TokioTicker {
    fn schedule(&mut self, method: BrewMethod, generation: u64) -> TickGuard {
        let tx = self.tx.clone();
        let period = self.period;
        let handle = tokio::spawn(async move {
            // first tick one full period after start, not immediately
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(TickEvent { method, generation }).is_err() {
                    break;
                }
            }
        });
        TickGuard::new(method, generation, move || handle.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brew_core::{BrewSession, RecipeInputs, StartOutcome, TickOutcome};
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::UnboundedReceiver<TickEvent>) -> Vec<TickEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_second_until_guard_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = TokioTicker::new(tx);
        let guard = ticker.schedule(BrewMethod::FrenchPress, 7);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let ticks = drain(&mut rx);
        assert_eq!(ticks.len(), 3);
        assert!(ticks.iter().all(|t| t.generation == 7 && t.method == BrewMethod::FrenchPress));

        drop(guard);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_tick_after_pause_is_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = TokioTicker::new(tx);
        let mut session = BrewSession::default();
        assert_eq!(session.start(&mut ticker), StartOutcome::Started);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        // one tick is sitting in the channel when the pause lands
        assert!(session.pause());
        let TickEvent { method, generation } = rx.recv().await.unwrap();
        assert_eq!(session.tick(method, generation), TickOutcome::Ignored);
        assert_eq!(session.active_timer().seconds_elapsed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drives_session_to_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = TokioTicker::new(tx);
        let mut session = BrewSession::new(RecipeInputs {
            brew_method: BrewMethod::AeroPress,
            ..RecipeInputs::default()
        });
        let total = session.recipe().total_brew_time_seconds;
        session.start(&mut ticker);

        let mut ticks = 0;
        loop {
            let ev = rx.recv().await.unwrap();
            ticks += 1;
            if session.tick(ev.method, ev.generation) == TickOutcome::Completed {
                break;
            }
        }
        assert_eq!(ticks, total + 1);
        assert!(session.view().is_complete());
        assert!(!session.active_timer().is_running());
    }
}
