use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::error::Result;
use crate::state::events::DEFAULT_LOG_LIMIT;
use crate::state::store::MissionStore;
use crate::watch::tracker::StatusReport;

/// How often the stop flag is checked while waiting.
const STOP_CHECK: Duration = Duration::from_millis(200);

/// Why the watch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Every tracked artifact exists.
    Complete,
    /// The stop flag was raised.
    Interrupted,
}

/// Re-render mission status until it completes or `stop` is raised.
///
/// Each tick reloads everything from the store, so the loop holds no state
/// across ticks and writes nothing. A change under `outputs/` ends the wait
/// early; without a working watcher the loop just polls.
pub fn watch_mission<F>(
    store: &MissionStore,
    mission_id: &str,
    interval: Duration,
    stop: &AtomicBool,
    mut render: F,
) -> Result<WatchOutcome>
where
    F: FnMut(&StatusReport),
{
    let (tx, rx) = mpsc::channel();
    let _watcher = watch_outputs(store, mission_id, tx);

    loop {
        if stop.load(Ordering::SeqCst) {
            return Ok(WatchOutcome::Interrupted);
        }

        let report = StatusReport::collect(store, mission_id, DEFAULT_LOG_LIMIT)?;
        render(&report);
        if report.is_complete() {
            return Ok(WatchOutcome::Complete);
        }

        let deadline = Instant::now() + interval;
        loop {
            if stop.load(Ordering::SeqCst) {
                return Ok(WatchOutcome::Interrupted);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match rx.recv_timeout(remaining.min(STOP_CHECK)) {
                Ok(()) => {
                    while rx.try_recv().is_ok() {}
                    debug!(mission = %mission_id, "outputs changed, refreshing early");
                    break;
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    std::thread::sleep(remaining.min(STOP_CHECK));
                }
            }
        }
    }
}

fn watch_outputs(
    store: &MissionStore,
    mission_id: &str,
    tx: mpsc::Sender<()>,
) -> Option<RecommendedWatcher> {
    let outputs = store.layout(mission_id).outputs_dir();
    if !outputs.is_dir() {
        debug!(dir = %outputs.display(), "outputs directory missing, polling only");
        return None;
    }

    let watcher = notify::recommended_watcher(move |res: std::result::Result<Event, _>| {
        if res.is_ok() {
            let _ = tx.send(());
        }
    });
    let mut watcher = match watcher {
        Ok(w) => w,
        Err(e) => {
            warn!(error = %e, "failed to create watcher, polling only");
            return None;
        }
    };
    if let Err(e) = watcher.watch(&outputs, RecursiveMode::NonRecursive) {
        warn!(dir = %outputs.display(), error = %e, "failed to watch outputs, polling only");
        return None;
    }
    Some(watcher)
}
