//! Dispatcher seam and per-frame fan-out

use futures::future::{join_all, BoxFuture};
use std::sync::atomic::{AtomicU64, Ordering};
use vogsync_core::Rgb;

/// One zone's command for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneCommand {
    pub endpoint: String,
    pub brightness: u8,
    pub color: Rgb,
}

impl ZoneCommand {
    pub fn new(endpoint: impl Into<String>, brightness: u8, color: Rgb) -> Self {
        Self {
            endpoint: endpoint.into(),
            brightness,
            color,
        }
    }
}

/// Something that can deliver a zone command.
///
/// `send` never fails from the caller's point of view: implementations bound it
/// by their own timeout and swallow delivery errors.
pub trait ZoneDispatch: Send + Sync {
    fn send<'a>(&'a self, endpoint: &'a str, brightness: u8, color: Rgb) -> BoxFuture<'a, ()>;

    /// Delivery counters, if the implementation keeps them.
    fn stats(&self) -> StatsSnapshot {
        StatsSnapshot::default()
    }
}

/// Send one frame's commands concurrently. Returns once every command has
/// completed or timed out.
pub async fn dispatch_all(dispatcher: &dyn ZoneDispatch, commands: &[ZoneCommand]) {
    join_all(
        commands
            .iter()
            .map(|cmd| dispatcher.send(&cmd.endpoint, cmd.brightness, cmd.color)),
    )
    .await;
}

/// Delivery counters shared across concurrent sends
#[derive(Debug, Default)]
pub struct DispatchStats {
    sent: AtomicU64,
    failed: AtomicU64,
}

impl DispatchStats {
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub sent: u64,
    pub failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<ZoneCommand>>,
        stats: DispatchStats,
    }

    impl ZoneDispatch for Recorder {
        fn send<'a>(&'a self, endpoint: &'a str, brightness: u8, color: Rgb) -> BoxFuture<'a, ()> {
            async move {
                self.seen
                    .lock()
                    .unwrap()
                    .push(ZoneCommand::new(endpoint, brightness, color));
                self.stats.record_sent();
            }
            .boxed()
        }

        fn stats(&self) -> StatsSnapshot {
            self.stats.snapshot()
        }
    }

    #[tokio::test]
    async fn test_dispatch_all_sends_every_command() {
        let recorder = Recorder::default();
        let commands = vec![
            ZoneCommand::new("http://a", 1, Rgb::new(1, 1, 1)),
            ZoneCommand::new("http://b", 2, Rgb::new(2, 2, 2)),
            ZoneCommand::new("http://c", 3, Rgb::new(3, 3, 3)),
        ];
        dispatch_all(&recorder, &commands).await;

        let mut seen = recorder.seen.lock().unwrap().clone();
        seen.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        assert_eq!(seen, commands);
        assert_eq!(recorder.stats().sent, 3);
    }

    #[tokio::test]
    async fn test_dispatch_all_empty_frame() {
        let recorder = Recorder::default();
        dispatch_all(&recorder, &[]).await;
        assert_eq!(recorder.stats(), StatsSnapshot::default());
    }

    #[test]
    fn test_stats_counters() {
        let stats = DispatchStats::default();
        stats.record_sent();
        stats.record_failed();
        stats.record_failed();
        assert_eq!(stats.snapshot(), StatsSnapshot { sent: 1, failed: 2 });
    }
}
