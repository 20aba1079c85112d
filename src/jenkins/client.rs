use super::models::{BuildActions, BuildInfo, JobInfo, JobPath};
use crate::client::{ApiClient, Result};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Read-only view of the CI server's JSON API.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait JenkinsClient: Send + Sync {
    async fn job_info(&self, job: &JobPath) -> Result<JobInfo>;
    async fn build_info(&self, job: &JobPath, number: u32) -> Result<BuildInfo>;
    async fn build_actions(&self, job: &JobPath, number: u32) -> Result<BuildActions>;
}

pub struct DefaultJenkinsClient {
    client: ApiClient,
    base_url: String,
}

impl DefaultJenkinsClient {
    const JOB_TREE: &'static str = "fullName,lastBuild[number,building,url]";
    const ACTIONS_TREE: &'static str =
        "actions[downstreamBuilds[number,url,jobName],subBuilds[result,url,jobName,buildNumber]]";

    pub fn new<B, U, P>(base_url: B, username: U, token: P, tls_verify: bool) -> Self
    where
        B: Into<String>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            client: ApiClient::from_credentials(username, token, tls_verify),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl JenkinsClient for DefaultJenkinsClient {
    async fn job_info(&self, job: &JobPath) -> Result<JobInfo> {
        let url = format!(
            "{}/{}/api/json?tree={}",
            self.base_url,
            job.api_path(),
            Self::JOB_TREE
        );
        self.client.get(&url).await
    }

    async fn build_info(&self, job: &JobPath, number: u32) -> Result<BuildInfo> {
        let url = format!("{}/{}/{}/api/json", self.base_url, job.api_path(), number);
        self.client.get(&url).await
    }

    async fn build_actions(&self, job: &JobPath, number: u32) -> Result<BuildActions> {
        let url = format!(
            "{}/{}/{}/api/json?tree={}",
            self.base_url,
            job.api_path(),
            number,
            Self::ACTIONS_TREE
        );
        self.client.get(&url).await
    }
}
