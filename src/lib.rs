pub mod client;
pub mod config;
pub mod jenkins;
pub mod monitoring;
pub mod ntfy;

pub use crate::config::BuildwatchConfig;
pub use monitoring::{
    BuildMonitor, BuildSelector, Error, MonitorConfig, TargetBuild, TreeWalker, WalkOptions,
};
