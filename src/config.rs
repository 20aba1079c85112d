use config::{Config, ConfigError, Environment, File};
use serde_derive::Deserialize;

/// Configuration loaded from a YAML file, overridable through
/// `BUILDWATCH_`-prefixed environment variables.
///
/// ```yaml
/// jenkins:
///   url: "https://jenkins.example.com"
///   username: "alice"
///   token: "XXXXXXXXX"
/// ntfy:
///   topic: "my-builds"
/// ```
#[derive(Deserialize, Debug)]
pub struct BuildwatchConfig {
    pub jenkins: JenkinsConfig,
    pub ntfy: NtfyConfig,

    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Deserialize, Debug)]
pub struct JenkinsConfig {
    pub url: String,
    pub username: String,
    pub token: String,

    /// Disables TLS certificate verification for the CI server.
    #[serde(default)]
    pub insecure: bool,
}

#[derive(Deserialize, Debug)]
pub struct NtfyConfig {
    #[serde(default = "default_ntfy_url")]
    pub url: String,

    pub topic: String,
}

#[derive(Deserialize, Debug)]
pub struct PollConfig {
    /// Seconds between status polls.
    #[serde(default = "default_poll_interval")]
    pub interval: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
        }
    }
}

fn default_ntfy_url() -> String {
    "https://ntfy.sh".into()
}

fn default_poll_interval() -> u64 {
    3
}

impl BuildwatchConfig {
    pub fn new(config_file_path: &str) -> Result<Self, ConfigError> {
        let mut config = Config::new();
        let config_file_path = shellexpand::tilde(config_file_path);
        config.merge(File::with_name(&config_file_path).required(false))?;
        config.merge(Environment::with_prefix("buildwatch").separator("_"))?;
        config.try_into()
    }
}
