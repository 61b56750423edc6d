use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::driver::ExamEvent;

/// Real-time pace of the exam countdown.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background task feeding `ExamEvent::Tick` into a driver's event queue.
///
/// Stops when `stop` is called, when the handle is dropped, or when the
/// receiving side goes away.
#[derive(Debug)]
pub struct CountdownTimer {
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    #[must_use]
    pub fn spawn(events: mpsc::Sender<ExamEvent>) -> Self {
        Self::spawn_with_period(events, TICK_PERIOD)
    }

    #[must_use]
    pub fn spawn_with_period(events: mpsc::Sender<ExamEvent>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if events.send(ExamEvent::Tick).await.is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
