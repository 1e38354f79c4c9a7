use anyhow::{Context, Result};
use autocommit_core::{AutoCommitter, Trigger};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::schedule::DailySchedule;

/// Long-running replacement for a hosted scheduler: sleeps until each fire
/// time and performs one scheduled run. Runs never overlap.
pub struct Daemon {
    committer: Arc<AutoCommitter>,
    schedule: DailySchedule,
}

impl Daemon {
    pub fn new(committer: AutoCommitter, schedule: DailySchedule) -> Self {
        Self {
            committer: Arc::new(committer),
            schedule,
        }
    }

    /// Fire on schedule until `shutdown` resolves. Returns the number of runs
    /// started. A failed run is logged and the daemon waits for the next one.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<usize>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut runs = 0;
        let mut next = self.schedule.next_after(Utc::now());
        loop {
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            info!("Next run at {} (in {}s)", next, wait.as_secs());

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested after {} run(s)", runs);
                    return Ok(runs);
                }
                _ = tokio::time::sleep(wait) => {}
            }

            runs += 1;
            let committer = Arc::clone(&self.committer);
            let result = tokio::task::spawn_blocking(move || committer.run(Trigger::Schedule))
                .await
                .context("Scheduled run panicked")?;
            if let Err(e) = result {
                error!("Scheduled run failed: {}", e.detailed());
            }

            next = self.schedule.next_after_run(next, Utc::now());
        }
    }
}

/// Run the daemon until Ctrl-C
pub async fn run(committer: AutoCommitter, schedule: DailySchedule) -> Result<()> {
    info!("Starting daemon with schedule '{}' (UTC)", schedule);
    let daemon = Daemon::new(committer, schedule);
    daemon
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await?;
    Ok(())
}
