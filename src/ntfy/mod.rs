pub mod client;
pub mod models;

pub use client::{Notifier, NtfyNotifier};
pub use models::Notification;
