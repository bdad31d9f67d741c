use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::anyhow;
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use domestika_core::models::course::VideoDescriptor;

/// One video to fetch, with the unit it belongs to and its position inside it.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub seq: usize,
    pub unit_title: String,
    pub index: usize,
    pub video: VideoDescriptor,
}

impl DownloadJob {
    pub fn label(&self) -> String {
        format!("{}/{}", self.unit_title, self.video.title.trim_end())
    }
}

#[derive(Debug)]
pub struct JobOutcome {
    pub seq: usize,
    pub label: String,
    pub result: anyhow::Result<()>,
}

impl JobOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct DownloadQueue {
    max_concurrent: usize,
}

impl DownloadQueue {
    pub fn new(max_concurrent: u32) -> Self {
        Self {
            max_concurrent: (max_concurrent as usize).max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Spawns every job at once; at most `max_concurrent` run their body at the
    /// same time. Waits for all of them and returns one outcome per job, in
    /// job order. A failing or panicking job does not stop the others.
    pub async fn run_all<F, Fut>(&self, jobs: Vec<DownloadJob>, run: F) -> Vec<JobOutcome>
    where
        F: Fn(DownloadJob) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set = JoinSet::new();
        let expected: Vec<(usize, String)> = jobs.iter().map(|j| (j.seq, j.label())).collect();

        for job in jobs {
            let semaphore = Arc::clone(&semaphore);
            let run = run.clone();

            join_set.spawn(async move {
                let seq = job.seq;
                let label = job.label();

                let _permit = match semaphore.acquire_owned().await {
                    Ok(p) => p,
                    Err(e) => {
                        return JobOutcome {
                            seq,
                            label,
                            result: Err(anyhow!("Semaphore closed: {}", e)),
                        }
                    }
                };

                let result = AssertUnwindSafe(run(job))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| Err(anyhow!("download task panicked")));

                JobOutcome { seq, label, result }
            });
        }

        let mut outcomes = Vec::with_capacity(expected.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!("[queue] download task aborted: {}", e),
            }
        }

        with_missing_as_failed(&expected, outcomes)
    }
}

/// One outcome per expected job, in job order. Jobs whose task never
/// reported back count as failed.
fn with_missing_as_failed(expected: &[(usize, String)], mut outcomes: Vec<JobOutcome>) -> Vec<JobOutcome> {
    for (seq, label) in expected {
        if !outcomes.iter().any(|o| o.seq == *seq) {
            outcomes.push(JobOutcome {
                seq: *seq,
                label: label.clone(),
                result: Err(anyhow!("download task aborted")),
            });
        }
    }
    outcomes.sort_by_key(|o| o.seq);
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn job(seq: usize, title: &str) -> DownloadJob {
        DownloadJob {
            seq,
            unit_title: "Unit".into(),
            index: seq,
            video: VideoDescriptor {
                playback_url: format!("https://cdn.example.com/{}.m3u8", seq),
                title: title.into(),
                section: "Section".into(),
            },
        }
    }

    #[tokio::test]
    async fn never_exceeds_max_concurrent() {
        let queue = DownloadQueue::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs = (0..6).map(|i| job(i, "v")).collect();
        let outcomes = queue
            .run_all(jobs, {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                move |_job| {
                    let in_flight = in_flight.clone();
                    let peak = peak.clone();
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok::<(), anyhow::Error>(())
                    }
                }
            })
            .await;

        assert_eq!(outcomes.len(), 6);
        assert!(outcomes.iter().all(JobOutcome::is_ok));
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn failures_are_collected_without_stopping_others() {
        let queue = DownloadQueue::new(4);
        let ran = Arc::new(AtomicUsize::new(0));

        let jobs = vec![job(0, "ok"), job(1, "bad"), job(2, "ok")];
        let outcomes = queue
            .run_all(jobs, {
                let ran = ran.clone();
                move |job| {
                    let ran = ran.clone();
                    async move {
                        ran.fetch_add(1, Ordering::SeqCst);
                        if job.video.title == "bad" {
                            anyhow::bail!("boom");
                        }
                        Ok(())
                    }
                }
            })
            .await;

        assert_eq!(ran.load(Ordering::SeqCst), 3);
        assert_eq!(outcomes.iter().map(|o| o.seq).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(outcomes[0].is_ok());
        assert!(!outcomes[1].is_ok());
        assert_eq!(outcomes[1].label, "Unit/bad");
        assert!(outcomes[2].is_ok());
    }

    #[tokio::test]
    async fn panicking_job_becomes_failed_outcome() {
        let queue = DownloadQueue::new(1);
        let outcomes = queue
            .run_all(vec![job(0, "a"), job(1, "b")], |job| async move {
                if job.seq == 0 {
                    panic!("unexpected");
                }
                Ok::<(), anyhow::Error>(())
            })
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_ok());
        assert!(outcomes[1].is_ok());
    }

    #[test]
    fn jobs_without_outcome_count_as_failed() {
        let expected = vec![(0, "Unit/a".to_string()), (1, "Unit/b".to_string()), (2, "Unit/c".to_string())];
        let reported = vec![
            JobOutcome { seq: 2, label: "Unit/c".into(), result: Ok(()) },
            JobOutcome { seq: 0, label: "Unit/a".into(), result: Ok(()) },
        ];

        let outcomes = with_missing_as_failed(&expected, reported);
        assert_eq!(outcomes.iter().map(|o| o.seq).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(outcomes[0].is_ok());
        assert!(!outcomes[1].is_ok());
        assert_eq!(outcomes[1].label, "Unit/b");
        assert!(outcomes[2].is_ok());
    }

    #[test]
    fn zero_concurrency_is_clamped_to_one() {
        assert_eq!(DownloadQueue::new(0).max_concurrent(), 1);
    }
}
