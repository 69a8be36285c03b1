use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::state::AppState;
use crate::tasks::quiz_maintenance;

const EXPIRE_INTERVAL_SECONDS: u64 = 15;

pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handles = vec![tokio::spawn(expire_sessions_loop(state.clone(), shutdown_rx.clone()))];
    tracing::info!(interval_seconds = EXPIRE_INTERVAL_SECONDS, "Quiz maintenance worker started");

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    for handle in handles {
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "Background task join failed");
        }
    }

    Ok(())
}

async fn expire_sessions_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick = interval(Duration::from_secs(EXPIRE_INTERVAL_SECONDS));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = quiz_maintenance::expire_overdue_sessions(&state).await {
                    tracing::error!(error = %err, "expire_overdue_sessions failed");
                }
            }
        }
    }
}
