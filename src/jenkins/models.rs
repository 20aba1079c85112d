use reqwest::Url;
use serde_derive::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A job addressed by its slash-delimited hierarchical path, e.g.
/// `folder/sub/my-job`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobPath {
    segments: Vec<String>,
}

impl JobPath {
    /// The path under the server root, with every segment prefixed by
    /// `job/`: `folder/my-job` becomes `job/folder/job/my-job`.
    pub fn api_path(&self) -> String {
        let parts: Vec<_> = self
            .segments
            .iter()
            .map(|segment| format!("job/{}", segment))
            .collect();
        parts.join("/")
    }

    /// Derives a job path and build number from a build page URL such as
    /// `https://ci.example.com/job/folder/job/app/42/`. A trailing numeric
    /// segment is taken as the build number. Returns `None` when the URL
    /// contains no `job/<name>` pairs at all.
    pub fn parse_build_url(url: &str) -> Option<(JobPath, Option<u32>)> {
        let url = Url::parse(url).ok()?;
        let mut parts: Vec<_> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        let number = parts.last().and_then(|last| last.parse().ok());
        if number.is_some() {
            parts.pop();
        }
        let mut segments = Vec::new();
        let mut index = 0;
        while index < parts.len() {
            if parts[index] == "job" && index + 1 < parts.len() {
                segments.push(parts[index + 1].to_string());
                index += 2;
            } else {
                index += 1;
            }
        }
        if segments.is_empty() {
            return None;
        }
        Some((JobPath { segments }, number))
    }
}

impl FromStr for JobPath {
    type Err = EmptyJobPathError;

    fn from_str(s: &str) -> Result<Self, EmptyJobPathError> {
        let segments: Vec<_> = s
            .split('/')
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect();
        if segments.is_empty() {
            return Err(EmptyJobPathError);
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for JobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("job path has no segments")]
pub struct EmptyJobPathError;

/// The identity of one build instance, used to de-duplicate the tree walk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildKey {
    pub job: JobPath,
    pub number: u32,
}

impl BuildKey {
    pub fn new(job: JobPath, number: u32) -> Self {
        Self { job, number }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct JobInfo {
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,

    #[serde(rename = "lastBuild")]
    pub last_build: Option<LastBuild>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LastBuild {
    pub number: u32,

    #[serde(default)]
    pub building: bool,

    pub url: Option<String>,
}

/// A point-in-time snapshot of one build. Produced fresh on every poll.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct BuildInfo {
    #[serde(default)]
    pub building: bool,

    pub result: Option<BuildResult>,

    /// Milliseconds the build took, 0 while still running.
    #[serde(default)]
    pub duration: u64,

    /// Historical duration estimate in milliseconds; the server reports a
    /// negative value when no history exists.
    #[serde(default, rename = "estimatedDuration")]
    pub estimated_duration: i64,

    /// Epoch milliseconds at which the build started.
    #[serde(default)]
    pub timestamp: i64,

    #[serde(rename = "fullDisplayName")]
    pub full_display_name: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum BuildResult {
    #[serde(rename = "SUCCESS")]
    Success,

    #[serde(rename = "UNSTABLE")]
    Unstable,

    #[serde(rename = "ABORTED")]
    Aborted,

    #[serde(rename = "FAILURE")]
    Failure,

    #[serde(other)]
    Unknown,
}

impl BuildResult {
    /// The ntfy tag attached to the completion notification.
    pub fn tag(&self) -> &'static str {
        match self {
            BuildResult::Success => "white_check_mark",
            BuildResult::Unstable => "warning",
            BuildResult::Aborted => "no_entry_sign",
            BuildResult::Failure => "x",
            BuildResult::Unknown => "grey_question",
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            BuildResult::Failure => 4,
            _ => 3,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            BuildResult::Success => 0,
            BuildResult::Unstable => 3,
            BuildResult::Aborted => 130,
            BuildResult::Failure => 1,
            BuildResult::Unknown => 2,
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Aborted => "ABORTED",
            BuildResult::Failure => "FAILURE",
            BuildResult::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// Downstream and sub-build action metadata attached to a finished build.
///
/// The actions array mixes many shapes; entries without either list
/// deserialize to empty lists and contribute nothing.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BuildActions {
    #[serde(default)]
    pub actions: Vec<BuildAction>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BuildAction {
    #[serde(default, rename = "downstreamBuilds")]
    pub downstream_builds: Vec<DownstreamBuild>,

    #[serde(default, rename = "subBuilds")]
    pub sub_builds: Vec<SubBuild>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DownstreamBuild {
    #[serde(rename = "jobName")]
    pub job_name: Option<String>,

    pub number: Option<u32>,

    pub url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SubBuild {
    #[serde(rename = "jobName")]
    pub job_name: Option<String>,

    #[serde(rename = "buildNumber")]
    pub build_number: Option<u32>,

    pub url: Option<String>,

    pub result: Option<BuildResult>,
}
