use super::error::Error;
use super::monitor::MonitorConfig;
use crate::jenkins::{JenkinsClient, JobInfo, JobPath};
use log::{debug, info};
use tokio::time::sleep;

/// The build chosen for tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetBuild {
    pub number: u32,
    pub display_name: String,
}

/// Decides which build of a job to track, optionally blocking until one
/// starts.
pub struct BuildSelector<'a, J> {
    jenkins: &'a J,
    config: &'a MonitorConfig,
}

impl<'a, J: JenkinsClient> BuildSelector<'a, J> {
    pub fn new(jenkins: &'a J, config: &'a MonitorConfig) -> Self {
        Self { jenkins, config }
    }

    /// A failure of the initial job query is fatal; once waiting, transient
    /// errors are swallowed and the poll continues indefinitely.
    pub async fn select(&self, job: &JobPath, wait_next: bool) -> Result<TargetBuild, Error> {
        let JobInfo {
            full_name,
            last_build,
        } = self.jenkins.job_info(job).await?;
        let display_name = full_name.unwrap_or_else(|| job.to_string());

        let last_number = match last_build {
            Some(build) if build.building => {
                info!("Tracking running build #{}", build.number);
                return Ok(TargetBuild {
                    number: build.number,
                    display_name,
                });
            }
            Some(build) if !wait_next => {
                info!(
                    "Tracking latest build #{} (may already be finished)",
                    build.number
                );
                return Ok(TargetBuild {
                    number: build.number,
                    display_name,
                });
            }
            Some(build) => Some(build.number),
            None if !wait_next => return Err(Error::NoBuildsFound(display_name)),
            None => None,
        };

        match last_number {
            Some(number) => info!("Waiting for a build after #{} to start...", number),
            None => info!("Waiting for the first build to start..."),
        }
        loop {
            let info = match self.jenkins.job_info(job).await {
                Ok(info) => info,
                Err(e) => {
                    debug!("Failed to poll job {}: {}", job, e);
                    sleep(self.config.poll_interval).await;
                    continue;
                }
            };
            if let Some(build) = info.last_build {
                // A newer build that already finished between two polls
                // still counts as the next one.
                if build.building || last_number.map_or(true, |last| build.number > last) {
                    return Ok(TargetBuild {
                        number: build.number,
                        display_name,
                    });
                }
            }
            sleep(self.config.poll_interval).await;
        }
    }
}
