use super::progress::{format_duration, ProgressReporter};
use crate::jenkins::{BuildResult, JenkinsClient, JobPath};
use crate::ntfy::{Notification, Notifier};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::sleep;

/// Immutable settings threaded through the whole monitoring run.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub server_url: String,
    pub poll_interval: Duration,
}

impl MonitorConfig {
    /// Human-facing page of one build, used as the direct link in
    /// notifications.
    pub fn build_page_url(&self, job: &JobPath, number: u32) -> String {
        format!(
            "{}/{}/{}",
            self.server_url.trim_end_matches('/'),
            job.api_path(),
            number
        )
    }
}

/// Polls one build until it leaves the running state, then reports the
/// terminal outcome and returns its exit code.
pub struct BuildMonitor<'a, J, N> {
    jenkins: &'a J,
    notifier: &'a N,
    config: &'a MonitorConfig,
}

impl<'a, J, N> BuildMonitor<'a, J, N>
where
    J: JenkinsClient,
    N: Notifier,
{
    pub fn new(jenkins: &'a J, notifier: &'a N, config: &'a MonitorConfig) -> Self {
        Self {
            jenkins,
            notifier,
            config,
        }
    }

    /// Transient fetch errors are retried at the poll interval without
    /// limit; the server is assumed eventually reachable.
    pub async fn run(&self, job: &JobPath, number: u32, display_name: &str) -> i32 {
        info!("Tracking {} #{}...", display_name, number);
        let mut reporter: Option<ProgressReporter> = None;
        loop {
            let snapshot = match self.jenkins.build_info(job, number).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    debug!("Failed to fetch {} #{}: {}", job, number, e);
                    sleep(self.config.poll_interval).await;
                    continue;
                }
            };
            // The estimate is anchored to the first snapshot; later ones
            // may report a different value mid-build.
            reporter
                .get_or_insert_with(|| {
                    ProgressReporter::new(snapshot.estimated_duration, snapshot.timestamp)
                })
                .report(display_name, number);

            if snapshot.building {
                sleep(self.config.poll_interval).await;
                continue;
            }

            let result = snapshot.result.unwrap_or(BuildResult::Unknown);
            return self
                .finish(job, number, display_name, result, snapshot.duration)
                .await;
        }
    }

    async fn finish(
        &self,
        job: &JobPath,
        number: u32,
        display_name: &str,
        result: BuildResult,
        duration_ms: u64,
    ) -> i32 {
        let url = self.config.build_page_url(job, number);
        let title = format!("Jenkins: {} #{} {}", display_name, number, result);
        let body = format!(
            "{} #{} finished with {} after {}\n{}",
            display_name,
            number,
            result,
            format_duration(duration_ms),
            url
        );
        println!("{}", title);
        println!("  {}", body.replace('\n', "  "));
        let notification = Notification {
            title,
            body,
            tags: result.tag(),
            priority: result.priority(),
        };
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!("Failed to deliver notification: {}", e);
        }
        result.exit_code()
    }
}
