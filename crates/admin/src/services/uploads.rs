//! Simulated progress for in-flight uploads.
//!
//! The storage API reports no transfer progress. While an upload future
//! runs, a timer ticks its [`SimulatedProgress`]; the value is forced to 100
//! only when the future resolves. The crop widget polls
//! `GET /api/uploads/{id}` and labels the bar as simulated.

use std::future::Future;
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use micrart_core::progress::{INTERVAL, SimulatedProgress};

/// How long a finished upload's progress stays readable.
const PROGRESS_TTL: Duration = Duration::from_secs(10 * 60);

const MAX_TRACKED_UPLOADS: u64 = 1_000;

/// Progress of recent uploads, keyed by the client-chosen upload id.
#[derive(Clone)]
pub struct UploadTracker {
    progress: Cache<Uuid, SimulatedProgress>,
}

impl Default for UploadTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            progress: Cache::builder()
                .max_capacity(MAX_TRACKED_UPLOADS)
                .time_to_live(PROGRESS_TTL)
                .build(),
        }
    }

    /// Current progress of `id`, if it is known.
    pub async fn get(&self, id: Uuid) -> Option<SimulatedProgress> {
        self.progress.get(&id).await
    }

    /// Drive `upload` to completion, ticking the progress of `id` meanwhile.
    ///
    /// Without an id the upload simply runs.
    pub async fn run<T, E, F>(&self, id: Option<Uuid>, upload: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let Some(id) = id else {
            return upload.await;
        };

        let mut progress = SimulatedProgress::new();
        self.progress.insert(id, progress).await;

        let mut ticker = tokio::time::interval(INTERVAL);
        // The first tick of an interval completes immediately.
        ticker.tick().await;

        tokio::pin!(upload);
        let result = loop {
            tokio::select! {
                result = &mut upload => break result,
                _ = ticker.tick() => {
                    progress = progress.tick();
                    self.progress.insert(id, progress).await;
                }
            }
        };

        let settled = if result.is_ok() {
            progress.finish()
        } else {
            progress.fail()
        };
        self.progress.insert(id, settled).await;
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use micrart_core::progress::{CAP, UploadState};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_while_in_flight_then_finishes() {
        let tracker = UploadTracker::new();
        let id = Uuid::new_v4();

        let background = tracker.clone();
        let handle = tokio::spawn(async move {
            background
                .run(Some(id), async {
                    tokio::time::sleep(Duration::from_millis(460)).await;
                    Ok::<_, ()>("url")
                })
                .await
        });

        // Three ticks at 150, 300 and 450 ms.
        tokio::time::sleep(Duration::from_millis(455)).await;
        let midway = tracker.get(id).await.unwrap();
        assert_eq!(midway.percent(), 15);
        assert_eq!(midway.state(), UploadState::InFlight);

        assert_eq!(handle.await.unwrap(), Ok("url"));
        let done = tracker.get(id).await.unwrap();
        assert_eq!(done.percent(), 100);
        assert_eq!(done.state(), UploadState::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_upload_caps_below_done() {
        let tracker = UploadTracker::new();
        let id = Uuid::new_v4();

        let background = tracker.clone();
        let handle = tokio::spawn(async move {
            background
                .run(Some(id), async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok::<_, ()>(())
                })
                .await
        });

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(tracker.get(id).await.unwrap().percent(), CAP);

        handle.await.unwrap().unwrap();
        assert_eq!(tracker.get(id).await.unwrap().percent(), 100);
    }

    #[tokio::test]
    async fn test_failure_resets_progress() {
        let tracker = UploadTracker::new();
        let id = Uuid::new_v4();

        let result = tracker
            .run(Some(id), async { Err::<(), _>("rejected") })
            .await;

        assert_eq!(result, Err("rejected"));
        let failed = tracker.get(id).await.unwrap();
        assert_eq!(failed.percent(), 0);
        assert_eq!(failed.state(), UploadState::Failed);
    }

    #[tokio::test]
    async fn test_untracked_upload_leaves_no_entry() {
        let tracker = UploadTracker::new();
        let result = tracker.run(None, async { Ok::<_, ()>(7) }).await;
        assert_eq!(result, Ok(7));
        assert_eq!(tracker.progress.entry_count(), 0);
    }
}
