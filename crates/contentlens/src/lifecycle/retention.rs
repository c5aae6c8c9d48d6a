use std::sync::Arc;

use tokio::task::JoinHandle;

use super::controller::Lifecycle;
use crate::config::RetentionConfig;

/// Starts the periodic age-based purge when `maxAgeSecs` is configured.
///
/// Returns `None` when retention is disabled. Must be called inside a tokio
/// runtime; the task runs until aborted or the runtime shuts down.
pub fn spawn_retention_sweeper(
    lifecycle: Arc<Lifecycle>,
    config: &RetentionConfig,
) -> Option<JoinHandle<()>> {
    let max_age = config.max_age()?;
    let interval = config.sweep_interval();

    tracing::info!(
        max_age_secs = max_age.as_secs(),
        interval_secs = interval.as_secs(),
        "Retention sweeper enabled"
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            lifecycle.purge_expired(max_age).await;
        }
    }))
}
