//! Periodic detail refresh while the selected web app is auto-deploying.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backend::WebAppBackend;
use crate::dashboard::Dashboard;

/// Re-fetch `web_app_id` every `period`, first tick one period from now.
///
/// Runs independently of the poller's cadence and exits as soon as the web
/// app is no longer both selected and auto-deploying, or `cancel` fires.
pub fn spawn_detail_refresher<B: WebAppBackend>(
    dashboard: Arc<Dashboard<B>>,
    web_app_id: String,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(%web_app_id, ?period, "detail refresher started");
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            if !dashboard.should_refresh(&web_app_id) {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = dashboard.fetch_detail(&web_app_id) => {}
            }
        }

        debug!(%web_app_id, "detail refresher stopped");
    })
}
