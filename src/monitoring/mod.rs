pub mod discovery;
pub mod error;
pub mod monitor;
pub mod progress;
pub mod selector;
pub mod walker;

pub use discovery::ChildBuild;
pub use error::Error;
pub use monitor::{BuildMonitor, MonitorConfig};
pub use selector::{BuildSelector, TargetBuild};
pub use walker::{TreeWalker, WalkOptions};
