use buildwatch::{
    jenkins::{DefaultJenkinsClient, JobPath},
    monitoring::{BuildSelector, Error, MonitorConfig, TreeWalker, WalkOptions},
    ntfy::NtfyNotifier,
    BuildwatchConfig,
};
use env_logger::Env;
use log::{error, info};
use std::process;
use std::time::Duration;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "buildwatch",
    about = "Notify when a CI build and its downstream builds finish."
)]
struct Args {
    /// Path to the YAML configuration file
    #[structopt(short, long, default_value = "~/.config/buildwatch/config.yml")]
    config: String,

    /// Slash-delimited job path, e.g. folder/subfolder/my-job
    #[structopt(short, long)]
    job: String,

    /// Wait for the next build to start instead of tracking the latest one
    #[structopt(long)]
    wait_next: bool,

    /// Do not monitor downstream builds
    #[structopt(long)]
    no_children: bool,

    /// Maximum downstream build depth to monitor
    #[structopt(long, default_value = "3")]
    max_depth: u32,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::from_args();
    process::exit(run(args).await);
}

async fn run(args: Args) -> i32 {
    let config = match BuildwatchConfig::new(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return 2;
        }
    };
    let job: JobPath = match args.job.parse() {
        Ok(job) => job,
        Err(e) => {
            error!("Invalid job path '{}': {}", args.job, e);
            return 2;
        }
    };

    let jenkins = DefaultJenkinsClient::new(
        config.jenkins.url.clone(),
        config.jenkins.username.clone(),
        config.jenkins.token.clone(),
        !config.jenkins.insecure,
    );
    let notifier = NtfyNotifier::new(config.ntfy.url.clone(), config.ntfy.topic.clone());
    let monitor_config = MonitorConfig {
        server_url: config.jenkins.url.clone(),
        poll_interval: Duration::from_secs(config.poll.interval),
    };

    let selector = BuildSelector::new(&jenkins, &monitor_config);
    let target = match selector.select(&job, args.wait_next).await {
        Ok(target) => target,
        Err(Error::NoBuildsFound(name)) => {
            error!(
                "{}: no builds found. Use --wait-next to wait for the next one.",
                name
            );
            return 2;
        }
        Err(Error::Client(e)) if e.not_found() => {
            error!("Job '{}' not found on the server", job);
            return 2;
        }
        Err(e) => {
            error!("Failed to query job '{}': {}", job, e);
            return 2;
        }
    };
    info!("Selected {} #{}", target.display_name, target.number);

    let options = WalkOptions {
        check_children: !args.no_children,
        max_depth: args.max_depth,
    };
    let walker = TreeWalker::new(&jenkins, &notifier, &monitor_config, options);
    walker.walk(job, target.number).await
}
