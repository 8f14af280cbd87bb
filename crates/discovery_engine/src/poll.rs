use std::time::Duration;

use discovery_core::{Job, JobId, JobStatus, PollProfile};
use discovery_logging::{discovery_debug, discovery_warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{ClientError, JobClient};

/// How a poll loop ended. Transport failures that exhaust the retry budget are the `Err` side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed(Job),
    Failed(Job),
    TimedOut { polls: u32 },
    Cancelled,
}

/// Polls `job_id` until the backend reports a terminal status.
///
/// `on_tick` runs after every non-terminal status check with the running poll count,
/// the latest snapshot and the estimated progress. The loop sleeps `profile.interval`
/// between checks and stops as soon as `cancel` fires. `deadline` is raced against both
/// the status request and the sleep, so a slow backend cannot push the timeout back.
pub async fn poll_until_terminal<F>(
    client: &dyn JobClient,
    job_id: &JobId,
    profile: &PollProfile,
    deadline: Option<Duration>,
    cancel: &CancellationToken,
    mut on_tick: F,
) -> Result<PollOutcome, ClientError>
where
    F: FnMut(u32, &Job, u8) + Send,
{
    let expires_at = deadline.map(|limit| Instant::now() + limit);
    let expired = async {
        match expires_at {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(expired);

    let mut polls: u32 = 0;
    let mut consecutive_errors: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            _ = &mut expired => return Ok(PollOutcome::TimedOut { polls }),
            result = client.poll_status(job_id) => result,
        };
        polls += 1;

        match result {
            Ok(job) => {
                consecutive_errors = 0;
                match job.status {
                    JobStatus::Completed => return Ok(PollOutcome::Completed(job)),
                    JobStatus::Failed => return Ok(PollOutcome::Failed(job)),
                    JobStatus::Queued | JobStatus::Processing => {
                        discovery_debug!("job {} is {:?} after {} polls", job_id, job.status, polls);
                        on_tick(polls, &job, profile.estimate(polls));
                    }
                }
            }
            Err(err) => {
                consecutive_errors += 1;
                if consecutive_errors > profile.max_consecutive_errors {
                    return Err(err);
                }
                discovery_warn!(
                    "status check {} for job {} failed ({}/{} tolerated): {}",
                    polls,
                    job_id,
                    consecutive_errors,
                    profile.max_consecutive_errors,
                    err
                );
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            _ = &mut expired => return Ok(PollOutcome::TimedOut { polls }),
            _ = tokio::time::sleep(profile.interval) => {}
        }
    }
}
