use super::discovery::discover_children;
use super::monitor::{BuildMonitor, MonitorConfig};
use crate::jenkins::{BuildKey, JenkinsClient, JobPath};
use crate::ntfy::Notifier;
use log::{debug, info};
use std::collections::HashSet;

/// Traversal limits for downstream monitoring.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub check_children: bool,
    pub max_depth: u32,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            check_children: true,
            max_depth: 3,
        }
    }
}

/// Monitors a build and its downstream builds depth-first, one at a time,
/// aggregating the worst exit code across the whole tree.
pub struct TreeWalker<'a, J, N> {
    jenkins: &'a J,
    notifier: &'a N,
    config: &'a MonitorConfig,
    options: WalkOptions,
}

struct PendingBuild {
    job: JobPath,
    number: u32,
    depth: u32,
}

impl<'a, J, N> TreeWalker<'a, J, N>
where
    J: JenkinsClient,
    N: Notifier,
{
    pub fn new(
        jenkins: &'a J,
        notifier: &'a N,
        config: &'a MonitorConfig,
        options: WalkOptions,
    ) -> Self {
        Self {
            jenkins,
            notifier,
            config,
            options,
        }
    }

    /// Walks the downstream graph as an explicit depth-first work-list.
    ///
    /// The visited set and the depth bound are independent termination
    /// guarantees: the former breaks cycles and diamond-shaped re-visits,
    /// the latter bounds fan-out.
    pub async fn walk(&self, job: JobPath, number: u32) -> i32 {
        let monitor = BuildMonitor::new(self.jenkins, self.notifier, self.config);
        let mut visited: HashSet<BuildKey> = HashSet::new();
        let mut pending = vec![PendingBuild {
            job,
            number,
            depth: 0,
        }];
        let mut worst = 0;
        while let Some(build) = pending.pop() {
            if !visited.insert(BuildKey::new(build.job.clone(), build.number)) {
                debug!("Skipping {} #{}: already monitored", build.job, build.number);
                continue;
            }
            let display_name = self.resolve_display_name(&build.job, build.number).await;
            let code = monitor.run(&build.job, build.number, &display_name).await;
            // First non-zero code wins; later failures never overwrite it
            if worst == 0 && code != 0 {
                worst = code;
            }

            if !self.options.check_children || build.depth >= self.options.max_depth {
                continue;
            }
            let children = discover_children(self.jenkins, &build.job, build.number).await;
            if children.is_empty() {
                continue;
            }
            info!(
                "{}Found {} downstream build(s) under {} #{}",
                "  ".repeat(build.depth as usize),
                children.len(),
                build.job,
                build.number
            );
            // Reversed so the stack monitors children in discovery order
            for child in children.into_iter().rev() {
                pending.push(PendingBuild {
                    job: child.job,
                    number: child.number,
                    depth: build.depth + 1,
                });
            }
        }
        worst
    }

    async fn resolve_display_name(&self, job: &JobPath, number: u32) -> String {
        match self.jenkins.build_info(job, number).await {
            Ok(info) => info.full_display_name.unwrap_or_else(|| job.to_string()),
            Err(e) => {
                debug!(
                    "Failed to resolve display name of {} #{}: {}",
                    job, number, e
                );
                job.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jenkins::client::MockJenkinsClient;
    use crate::jenkins::models::{BuildActions, BuildInfo, BuildResult};
    use crate::ntfy::client::MockNotifier;
    use serde_json::json;
    use std::time::Duration;

    fn test_config() -> MonitorConfig {
        MonitorConfig {
            server_url: "https://ci.example.com".into(),
            poll_interval: Duration::from_millis(1),
        }
    }

    fn finished(result: BuildResult) -> BuildInfo {
        BuildInfo {
            building: false,
            result: Some(result),
            duration: 1_000,
            estimated_duration: 0,
            timestamp: 0,
            full_display_name: None,
        }
    }

    fn downstream(children: &[(&str, u32)]) -> serde_json::Value {
        let list: Vec<_> = children
            .iter()
            .map(|(job, number)| json!({"jobName": job, "number": number}))
            .collect();
        json!({"actions": [{"downstreamBuilds": list}]})
    }

    fn expect_build(
        jenkins: &mut MockJenkinsClient,
        path: &str,
        number: u32,
        result: BuildResult,
        children: serde_json::Value,
    ) {
        let actions: BuildActions = serde_json::from_value(children).unwrap();
        let job: JobPath = path.parse().unwrap();
        let info_job = job.clone();
        jenkins
            .expect_build_info()
            .withf(move |job, n| *job == info_job && *n == number)
            .returning(move |_, _| Ok(finished(result)));
        jenkins
            .expect_build_actions()
            .withf(move |j, n| *j == job && *n == number)
            .returning(move |_, _| Ok(actions.clone()));
    }

    fn notifier_expecting(count: usize) -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(count).returning(|_| Ok(()));
        notifier
    }

    #[tokio::test]
    async fn test_worst_child_code_aggregated() {
        let mut jenkins = MockJenkinsClient::new();
        expect_build(
            &mut jenkins,
            "root",
            1,
            BuildResult::Success,
            downstream(&[("ok", 2), ("bad", 3)]),
        );
        expect_build(&mut jenkins, "ok", 2, BuildResult::Success, downstream(&[]));
        expect_build(&mut jenkins, "bad", 3, BuildResult::Failure, downstream(&[]));
        let notifier = notifier_expecting(3);

        let config = test_config();
        let walker = TreeWalker::new(&jenkins, &notifier, &config, WalkOptions::default());
        assert_eq!(walker.walk("root".parse().unwrap(), 1).await, 1);
    }

    #[tokio::test]
    async fn test_own_failure_takes_precedence_over_children() {
        let mut jenkins = MockJenkinsClient::new();
        expect_build(
            &mut jenkins,
            "root",
            1,
            BuildResult::Aborted,
            downstream(&[("bad", 2)]),
        );
        expect_build(&mut jenkins, "bad", 2, BuildResult::Failure, downstream(&[]));
        let notifier = notifier_expecting(2);

        let config = test_config();
        let walker = TreeWalker::new(&jenkins, &notifier, &config, WalkOptions::default());
        assert_eq!(walker.walk("root".parse().unwrap(), 1).await, 130);
    }

    #[tokio::test]
    async fn test_first_failing_child_wins() {
        let mut jenkins = MockJenkinsClient::new();
        expect_build(
            &mut jenkins,
            "root",
            1,
            BuildResult::Success,
            downstream(&[("unstable", 2), ("failed", 3)]),
        );
        expect_build(
            &mut jenkins,
            "unstable",
            2,
            BuildResult::Unstable,
            downstream(&[]),
        );
        expect_build(
            &mut jenkins,
            "failed",
            3,
            BuildResult::Failure,
            downstream(&[]),
        );
        let notifier = notifier_expecting(3);

        let config = test_config();
        let walker = TreeWalker::new(&jenkins, &notifier, &config, WalkOptions::default());
        assert_eq!(walker.walk("root".parse().unwrap(), 1).await, 3);
    }

    #[tokio::test]
    async fn test_diamond_graph_monitored_once() {
        let mut jenkins = MockJenkinsClient::new();
        expect_build(
            &mut jenkins,
            "root",
            1,
            BuildResult::Success,
            downstream(&[("left", 2), ("right", 3)]),
        );
        expect_build(
            &mut jenkins,
            "left",
            2,
            BuildResult::Success,
            downstream(&[("shared", 4)]),
        );
        expect_build(
            &mut jenkins,
            "right",
            3,
            BuildResult::Success,
            downstream(&[("shared", 4)]),
        );
        expect_build(
            &mut jenkins,
            "shared",
            4,
            BuildResult::Success,
            downstream(&[]),
        );
        // Four distinct builds, four notifications: "shared" is reachable
        // through both parents but only monitored once
        let notifier = notifier_expecting(4);

        let config = test_config();
        let walker = TreeWalker::new(&jenkins, &notifier, &config, WalkOptions::default());
        assert_eq!(walker.walk("root".parse().unwrap(), 1).await, 0);
    }

    #[tokio::test]
    async fn test_max_depth_bounds_discovery() {
        let mut jenkins = MockJenkinsClient::new();
        expect_build(
            &mut jenkins,
            "root",
            1,
            BuildResult::Success,
            downstream(&[("child", 2)]),
        );
        let child_job: JobPath = "child".parse().unwrap();
        let child_info_job = child_job.clone();
        jenkins
            .expect_build_info()
            .withf(move |job, n| *job == child_info_job && *n == 2)
            .returning(|_, _| Ok(finished(BuildResult::Success)));
        // The child is monitored but never asked for its own children
        jenkins
            .expect_build_actions()
            .withf(move |job, n| *job == child_job && *n == 2)
            .times(0);
        let notifier = notifier_expecting(2);

        let options = WalkOptions {
            check_children: true,
            max_depth: 1,
        };
        let config = test_config();
        let walker = TreeWalker::new(&jenkins, &notifier, &config, options);
        assert_eq!(walker.walk("root".parse().unwrap(), 1).await, 0);
    }

    #[tokio::test]
    async fn test_child_checking_disabled() {
        let mut jenkins = MockJenkinsClient::new();
        let job: JobPath = "root".parse().unwrap();
        let info_job = job.clone();
        jenkins
            .expect_build_info()
            .withf(move |j, n| *j == info_job && *n == 1)
            .returning(|_, _| Ok(finished(BuildResult::Failure)));
        jenkins.expect_build_actions().times(0);
        let notifier = notifier_expecting(1);

        let options = WalkOptions {
            check_children: false,
            max_depth: 3,
        };
        let config = test_config();
        let walker = TreeWalker::new(&jenkins, &notifier, &config, options);
        assert_eq!(walker.walk(job, 1).await, 1);
    }

    #[tokio::test]
    async fn test_display_name_prefers_full_display_name() {
        let mut jenkins = MockJenkinsClient::new();
        jenkins.expect_build_info().returning(|_, _| {
            Ok(BuildInfo {
                full_display_name: Some("folder » app #7".into()),
                ..finished(BuildResult::Success)
            })
        });
        jenkins
            .expect_build_actions()
            .returning(|_, _| Ok(BuildActions::default()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| n.title.contains("folder » app"))
            .times(1)
            .returning(|_| Ok(()));

        let config = test_config();
        let walker = TreeWalker::new(&jenkins, &notifier, &config, WalkOptions::default());
        assert_eq!(walker.walk("folder/app".parse().unwrap(), 7).await, 0);
    }
}
