//! Status polling.
//!
//! Polls at a fixed interval and stops on the first terminal status, so a
//! finished task never costs more than one extra request.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tutor_shared::api::StatusResponse;

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Task reached `completed` or `failed`
    Finished(StatusResponse),
    /// Poll budget exhausted while the task was still processing
    GaveUp { last: StatusResponse, polls: u32 },
}

/// Poll `fetch` until it reports a terminal status or `max_polls` is spent.
///
/// `on_poll` sees every non-terminal response. Fetch errors end the loop;
/// an unknown task id does not become known by asking again.
pub async fn poll_until_terminal<F, Fut, P>(
    interval: Duration,
    max_polls: u32,
    mut fetch: F,
    mut on_poll: P,
) -> Result<PollOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<StatusResponse>>,
    P: FnMut(&StatusResponse),
{
    let max_polls = max_polls.max(1);
    let mut polls = 0;
    loop {
        let view = fetch().await?;
        polls += 1;

        if view.status.is_terminal() {
            return Ok(PollOutcome::Finished(view));
        }
        on_poll(&view);

        if polls >= max_polls {
            return Ok(PollOutcome::GaveUp { last: view, polls });
        }
        tokio::time::sleep(interval).await;
    }
}
