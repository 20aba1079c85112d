use crate::jenkins::{BuildActions, BuildResult, JenkinsClient, JobPath};
use log::debug;

/// A downstream build discovered from a finished parent.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildBuild {
    pub job: JobPath,
    pub number: u32,

    /// The result a sub-build reported at discovery time. Informational
    /// only: the child may still be running and is always monitored
    /// independently.
    pub result_hint: Option<BuildResult>,
}

/// Collects the downstream and sub-builds recorded on a finished build.
///
/// Discovery is best-effort: an unreachable or unrecognizable child tree
/// yields an empty list rather than an error.
pub async fn discover_children<J: JenkinsClient>(
    jenkins: &J,
    job: &JobPath,
    number: u32,
) -> Vec<ChildBuild> {
    let actions = match jenkins.build_actions(job, number).await {
        Ok(actions) => actions,
        Err(e) => {
            debug!(
                "Failed to fetch downstream builds of {} #{}: {}",
                job, number, e
            );
            return Vec::new();
        }
    };
    collect_children(actions)
}

fn collect_children(actions: BuildActions) -> Vec<ChildBuild> {
    let mut children = Vec::new();
    for action in actions.actions {
        for build in action.downstream_builds {
            children.extend(resolve_child(build.job_name, build.number, build.url, None));
        }
        for build in action.sub_builds {
            let resolved = resolve_child(
                build.job_name,
                build.build_number,
                build.url,
                build.result,
            );
            if let Some(child) = resolved {
                if let Some(result) = child.result_hint {
                    debug!(
                        "Sub-build {} #{} reported {} at discovery time",
                        child.job, child.number, result
                    );
                }
                children.push(child);
            }
        }
    }
    children
}

/// Children lacking a resolvable job path or build number are dropped.
fn resolve_child(
    job_name: Option<String>,
    number: Option<u32>,
    url: Option<String>,
    result_hint: Option<BuildResult>,
) -> Option<ChildBuild> {
    let parsed_url = url.as_deref().and_then(JobPath::parse_build_url);
    let job = match job_name.as_deref().map(str::parse) {
        Some(Ok(job)) => Some(job),
        _ => parsed_url.as_ref().map(|(job, _)| job.clone()),
    };
    let number = number.or_else(|| parsed_url.as_ref().and_then(|(_, number)| *number));
    match (job, number) {
        (Some(job), Some(number)) => Some(ChildBuild {
            job,
            number,
            result_hint,
        }),
        _ => None,
    }
}
