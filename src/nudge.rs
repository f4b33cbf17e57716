//! Daily nudge marker: a periodic sweep that stamps today's calendar day
//! onto every reminder whose deadline has not passed. The sweep records
//! bookkeeping only; it never delivers a notification itself.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::store::Store;

const SWEEP_PERIOD: Duration = Duration::from_secs(15 * 60);

/// Today as the `YYYY-MM-DD` string all date comparisons use.
pub fn today_string() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Runs the sweep every 15 minutes for the life of the process. A failed
/// iteration is logged and dropped; the next tick runs regardless.
pub async fn run_sweeper(store: Arc<Store>) {
    loop {
        let today = today_string();
        match store.mark_notified(&today).await {
            Ok(0) => log::debug!("Nudge sweep for {}: nothing to stamp", today),
            Ok(stamped) => log::info!("Nudge sweep for {}: stamped {} reminder(s)", today, stamped),
            Err(e) => log::warn!("Nudge sweep for {} failed: {}", today, e),
        }
        tokio::time::sleep(SWEEP_PERIOD).await;
    }
}
