//! Waiter
//!
//! Polls a run until the service reports a terminal status or the deadline
//! passes. Once started the wait cannot be cancelled.

use kfdeploy_client::{ClientError, PipelineApi};
use kfdeploy_core::domain::run::WaitOutcome;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Default wait before giving up (5 hours)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(18_000);

/// Polling behaviour
#[derive(Debug, Clone)]
pub struct WaitSettings {
    /// Give up after this long without a terminal status
    pub timeout: Duration,
    /// Pause between status checks
    pub poll_interval: Duration,
    /// Consecutive transient lookup failures tolerated before giving up
    pub max_poll_errors: u32,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: Duration::from_secs(5),
            max_poll_errors: 3,
        }
    }
}

/// Wait for run `run_id` to finish
///
/// # Returns
/// - `WaitOutcome::Finished` with the status text exactly as reported
/// - `WaitOutcome::TimedOut` once `timeout` has elapsed without a terminal
///   status, never earlier
///
/// # Errors
/// A lookup error that is not transient, or more than `max_poll_errors`
/// transient ones in a row
pub async fn wait<S: PipelineApi + ?Sized>(
    session: &S,
    run_id: &str,
    settings: &WaitSettings,
) -> Result<WaitOutcome, ClientError> {
    // A timeout too large to represent never expires
    let deadline = Instant::now().checked_add(settings.timeout);
    let mut consecutive_errors = 0u32;

    info!(
        "Waiting for run {} (timeout: {:?}, poll interval: {:?})",
        run_id, settings.timeout, settings.poll_interval
    );

    loop {
        match session.get_run(run_id).await {
            Ok(detail) => {
                consecutive_errors = 0;
                let status = detail.run.run_status();
                if status.is_terminal() {
                    let reported = detail.run.status.unwrap_or_else(|| status.to_string());
                    info!("Run {} finished with status {}", run_id, reported);
                    return Ok(WaitOutcome::Finished(reported));
                }
                debug!("Run {} is {}", run_id, status);
            }
            Err(e) if e.is_transient() && consecutive_errors < settings.max_poll_errors => {
                consecutive_errors += 1;
                warn!(
                    "Failed to get status of run {} (attempt {}/{}): {}",
                    run_id, consecutive_errors, settings.max_poll_errors, e
                );
            }
            Err(e) => return Err(e),
        }

        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    warn!("Run {} did not finish within {:?}", run_id, settings.timeout);
                    return Ok(WaitOutcome::TimedOut);
                }
                settings.poll_interval.min(deadline - now)
            }
            None => settings.poll_interval,
        };

        time::sleep(pause).await;
    }
}
