//! Scan driver: ticks a controller's scan timer at display refresh rate
//!
//! One tick per interval; tick N's frame is published before interval N+1
//! is awaited. The task ends when the controller stops honoring the timer,
//! and is aborted when the driver is cancelled or dropped.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use crate::core::reveal::{RevealController, ScanTimer};
use crate::types::ScanFrame;

/// Owns the background task for one scan
#[derive(Debug)]
pub struct ScanDriver {
    handle: JoinHandle<u64>,
}

impl ScanDriver {
    /// Spawn the tick loop for `timer`, publishing frames on `frames`
    pub fn spawn(
        controller: Arc<Mutex<RevealController>>,
        timer: ScanTimer,
        frame_interval: Duration,
        frames: broadcast::Sender<ScanFrame>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(frame_interval.max(Duration::from_millis(1)));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut sent = 0;

            loop {
                interval.tick().await;
                let frame = controller.lock().await.tick(&timer);
                let Some(frame) = frame else {
                    break;
                };
                // No subscribers is fine; the controller still advances
                let _ = frames.send(frame);
                sent += 1;
                if frame.done {
                    break;
                }
            }

            debug!(frames = sent, "scan driver finished");
            sent
        });

        Self { handle }
    }

    /// Stop ticking now
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the scan to end; returns frames published (0 if aborted)
    pub async fn join(mut self) -> u64 {
        (&mut self.handle).await.unwrap_or(0)
    }
}

impl Drop for ScanDriver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reveal::ScanConfig;

    fn shared() -> Arc<Mutex<RevealController>> {
        Arc::new(Mutex::new(RevealController::new(ScanConfig {
            step: 100.0,
            frame_interval: Duration::from_millis(1),
        })))
    }

    #[tokio::test]
    async fn test_runs_to_completion() {
        let controller = shared();
        let timer = controller.lock().await.begin(300.0);
        let (tx, mut rx) = broadcast::channel(16);

        let driver = ScanDriver::spawn(controller.clone(), timer, Duration::from_millis(1), tx);
        assert_eq!(driver.join().await, 3);

        let mut positions = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            positions.push(frame.position);
        }
        assert_eq!(positions, vec![100.0, 200.0, 300.0]);
        assert!(!controller.lock().await.is_scanning());
    }

    #[tokio::test]
    async fn test_stops_when_stage_advances() {
        let controller = shared();
        let timer = controller.lock().await.begin(1_000_000.0);
        let (tx, _rx) = broadcast::channel(1024);

        let driver = ScanDriver::spawn(controller.clone(), timer, Duration::from_millis(1), tx);
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.lock().await.advance_stage(1);

        tokio::time::timeout(Duration::from_secs(1), async {
            while !driver.is_finished() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("driver should stop after stage advance");
    }

    #[tokio::test]
    async fn test_drop_aborts_task() {
        let controller = shared();
        let timer = controller.lock().await.begin(1_000_000.0);
        let (tx, _rx) = broadcast::channel(1024);

        let driver = ScanDriver::spawn(controller.clone(), timer, Duration::from_millis(1), tx);
        tokio::time::sleep(Duration::from_millis(5)).await;
        drop(driver);
        tokio::time::sleep(Duration::from_millis(5)).await;

        let frames = controller.lock().await.frames();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(controller.lock().await.frames(), frames);
    }
}
