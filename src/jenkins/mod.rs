pub mod client;
pub mod models;

pub use client::{DefaultJenkinsClient, JenkinsClient};
pub use models::{
    BuildAction, BuildActions, BuildInfo, BuildKey, BuildResult, DownstreamBuild, JobInfo, JobPath,
    LastBuild, SubBuild,
};
